//! 作品评分聚合
//!
//! 评分不落库，每次读取时按评论集合重新计算

use super::review::Score;

/// 评分聚合器
pub struct RatingAggregator;

impl RatingAggregator {
    /// 评论分数的算术平均，四舍五入（.5 向上）；没有评论时为 `None`
    pub fn compute<I>(scores: I) -> Option<u8>
    where
        I: IntoIterator<Item = Score>,
    {
        let (sum, count) = scores
            .into_iter()
            .fold((0i64, 0i64), |(sum, count), score| {
                (sum + i64::from(score.value()), count + 1)
            });
        Self::from_totals(sum, count)
    }

    /// 由存储侧的 SUM/COUNT 计算，规则与 [`compute`](Self::compute) 相同
    pub fn from_totals(sum: i64, count: i64) -> Option<u8> {
        if count <= 0 {
            return None;
        }
        // round(sum / count) = floor((2·sum + count) / (2·count))，分数均为正
        let rounded = (2 * sum + count).div_euclid(2 * count);
        let clamped = rounded.clamp(i64::from(Score::MIN), i64::from(Score::MAX));
        u8::try_from(clamped).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[u8]) -> Vec<Score> {
        values
            .iter()
            .map(|v| Score::new(i64::from(*v)).unwrap())
            .collect()
    }

    #[test]
    fn test_empty_has_no_rating() {
        assert_eq!(RatingAggregator::compute(Vec::new()), None);
        assert_eq!(RatingAggregator::from_totals(0, 0), None);
    }

    #[test]
    fn test_mean_is_rounded() {
        assert_eq!(RatingAggregator::compute(scores(&[8, 9, 10])), Some(9));
        assert_eq!(RatingAggregator::compute(scores(&[1, 2])), Some(2));
        assert_eq!(RatingAggregator::compute(scores(&[1, 1, 2])), Some(1));
        assert_eq!(RatingAggregator::compute(scores(&[9, 10])), Some(10));
        assert_eq!(RatingAggregator::compute(scores(&[7])), Some(7));
    }

    #[test]
    fn test_totals_match_compute() {
        let set = scores(&[3, 4, 4, 10]);
        assert_eq!(
            RatingAggregator::compute(set.clone()),
            RatingAggregator::from_totals(21, 4)
        );
    }

    #[test]
    fn test_compute_is_idempotent() {
        let set = scores(&[2, 5, 6]);
        let first = RatingAggregator::compute(set.clone());
        let second = RatingAggregator::compute(set);
        assert_eq!(first, second);
    }

    #[test]
    fn test_result_stays_in_score_range() {
        for a in Score::MIN..=Score::MAX {
            for b in Score::MIN..=Score::MAX {
                let rating = RatingAggregator::compute(scores(&[a, b])).unwrap();
                assert!((Score::MIN..=Score::MAX).contains(&rating));
            }
        }
    }
}
