//! 终端界面
//!
//! - `console` - 逐行读取标准输入
//! - `render` - 各页面的文本渲染

pub mod console;
pub mod render;

pub use console::Console;
