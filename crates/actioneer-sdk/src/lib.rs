// actioneer-sdk: Foundation layer for the Actioneer workflow engine.
// This crate has ZERO dependencies on other actioneer crates and provides
// the process, tracing and file-system primitives the engine is built on.

pub mod io_util;
pub mod process_invoker;
pub mod string_util;
pub mod trace;
pub mod which_util;

// Re-export commonly used items at crate root
pub use io_util::IOUtil;
pub use process_invoker::{
    ProcessDataReceivedEventArgs, ProcessError, ProcessInvoker, ProcessStartInfo,
};
pub use string_util::StringUtil;
pub use trace::TraceWriter;
pub use which_util::WhichUtil;
