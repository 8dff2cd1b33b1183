//! # cmkit
//!
//! A Rust library for driving the `cmake` executable: typed option values,
//! declarative configure/build/install commands, and a supervised
//! invocation that streams the tool's output to registered workers.
//!
//! `cmkit` does not reimplement any part of CMake. It compiles option
//! values into the exact argument lists the `cmake` command line expects,
//! spawns it with a merged environment, and forwards every output line and
//! the final exit code to listeners.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cmkit::{Command, InitOptions, RawArgs};
//!
//! # fn main() -> cmkit::Result<()> {
//! // Resolve cmake from PATH once, process-wide.
//! cmkit::initialize(InitOptions::default())?;
//!
//! let configure = Command::configure().with([
//!     ("source_dir", "./my_project"),
//!     ("build_dir", "out"),
//! ])?;
//!
//! let mut cmake = cmkit::instance()?;
//! cmake.invoke(&configure, &RawArgs::default())?;
//! cmake.invoke(&Command::build(), &RawArgs::new(["--", "-d", "explain"]))?;
//! # Ok(())
//! # }
//! ```
//!
//! ```no_run
//! use cmkit::{Command, InitOptions, RawArgs, Value, Worker, WorkerId};
//!
//! // Observe output lines and the exit code.
//! struct Echo(WorkerId);
//!
//! impl Worker for Echo {
//!     fn id(&self) -> WorkerId {
//!         self.0
//!     }
//!     fn on_output(&mut self, _lines: &[String], current: &str) {
//!         println!("cmake: {current}");
//!     }
//!     fn on_exit(&mut self, code: i32) {
//!         println!("cmake finished with {code}");
//!     }
//! }
//!
//! # fn main() -> cmkit::Result<()> {
//! cmkit::initialize(InitOptions::default())?;
//!
//! let mut configure = Command::configure();
//! configure.set(
//!     "variables",
//!     Value::vardict([("CMAKE_EXPORT_COMPILE_COMMANDS", Value::from(true))]),
//! )?;
//!
//! cmkit::instance()?
//!     .register_worker(Box::new(Echo(WorkerId::random())))
//!     .invoke(&configure, &RawArgs::default())?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

pub mod command;
pub mod consts;
pub mod error;
pub mod instance;
pub mod locate;
mod logging;
pub mod options;
pub mod value;

pub use command::Command;
pub use error::{CmakeError, Result};
pub use instance::{CMake, Worker, WorkerId};
pub use options::{ArgStyle, CommandOption, InitOptions, OptionKind, RawArgs};
pub use value::{Value, ValueKind};

static DEFAULT: OnceLock<Mutex<CMake>> = OnceLock::new();

/// Initializes the process-wide default instance: optionally starts file
/// logging, then resolves and self-tests the cmake executable.
///
/// Calling this again after a successful initialization is a no-op.
pub fn initialize(options: InitOptions) -> Result<()> {
    if DEFAULT.get().is_some() {
        return Ok(());
    }

    if options.enable_logging {
        logging::init(&options.log_file)?;
    }

    let cmake = locate::locate(options.cmake_path.as_deref())?;
    // First writer wins; a concurrent initializer resolved the same tool.
    let _ = DEFAULT.set(Mutex::new(cmake));
    Ok(())
}

/// The default instance created by [`initialize`].
///
/// Fails with [`CmakeError::NotInitialized`] when [`initialize`] has not
/// completed successfully.
pub fn instance() -> Result<MutexGuard<'static, CMake>> {
    let cell = DEFAULT.get().ok_or(CmakeError::NotInitialized)?;
    Ok(cell.lock().unwrap_or_else(PoisonError::into_inner))
}
