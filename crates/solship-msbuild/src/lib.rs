//! Build-tool driver for Xamarin-style solutions: project discovery,
//! msbuild/mdtool command construction, execution, and artifact lookup.

pub mod command;
pub mod driver;
pub mod error;
pub mod invoke;
pub mod outputs;
pub mod solution;

pub use command::{BuildCommand, BuildTool};
pub use driver::MsBuildDriver;
pub use error::DriverError;
pub use invoke::ExecutionReport;
pub use outputs::BuildWindow;
