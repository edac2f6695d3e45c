//! ports - 抽象 trait 层
//!
//! 定义应用层依赖的基础设施接口

mod email;

pub use email::*;
