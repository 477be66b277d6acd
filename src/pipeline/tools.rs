//! External command-line tools: `inflate_to_sphere_implicit` and `surface_mask2`.
//!
//! Both are black boxes with a file-in/file-out contract. Calls block until the
//! process exits (there is no timeout) and a non-zero exit is always an error.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;

use thiserror::Error;

use super::InflationParameters;

pub const DEFAULT_INFLATE_TOOL: &str = "inflate_to_sphere_implicit";
pub const DEFAULT_MASK_TOOL: &str = "surface_mask2";

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` {}", describe_exit(.code))]
    ExitStatus { program: String, code: Option<i32> },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// A program plus its arguments, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Program names for the two external tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    pub inflate_program: String,
    pub mask_program: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            inflate_program: DEFAULT_INFLATE_TOOL.to_string(),
            mask_program: DEFAULT_MASK_TOOL.to_string(),
        }
    }
}

impl ToolSettings {
    /// `inflate_to_sphere_implicit <input> <output> <p1> <p2>`
    #[must_use]
    pub fn inflate(
        &self,
        input: &Path,
        output: &Path,
        parameters: &InflationParameters,
    ) -> ToolInvocation {
        let [first, second] = parameters.args();
        ToolInvocation::new(&self.inflate_program)
            .arg(input)
            .arg(output)
            .arg(first)
            .arg(second)
    }

    /// `surface_mask2 <template.mnc> <surface.obj> <mask.mnc>`
    #[must_use]
    pub fn mask(&self, template: &Path, surface: &Path, mask: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.mask_program)
            .arg(template)
            .arg(surface)
            .arg(mask)
    }
}

/// Runs external tools. The seam lets tests substitute a fake.
pub trait ToolRunner {
    /// # Errors
    /// Returns [`ToolError`] if the program cannot be started or exits non-zero.
    fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolError>;
}

/// Runs tools as child processes, inheriting stdout/stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolError> {
        log::info!("running {invocation}");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()
            .map_err(|source| ToolError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::ExitStatus {
                program: invocation.program.clone(),
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn inflate_invocation_forwards_parameters_verbatim() {
        let params: InflationParameters = "100, 2.50".parse().expect("params");
        let invocation = ToolSettings::default().inflate(
            Path::new("in/lh.obj"),
            Path::new("out/lh_inflated.obj"),
            &params,
        );
        assert_eq!(
            invocation.to_string(),
            "inflate_to_sphere_implicit in/lh.obj out/lh_inflated.obj 100 2.50"
        );
    }

    #[test]
    fn mask_invocation_orders_template_surface_mask() {
        let settings = ToolSettings {
            mask_program: "/opt/civet/bin/surface_mask2".to_string(),
            ..ToolSettings::default()
        };
        let invocation = settings.mask(
            &PathBuf::from("t.mnc"),
            &PathBuf::from("s.obj"),
            &PathBuf::from("s.mnc"),
        );
        assert_eq!(invocation.program, "/opt/civet/bin/surface_mask2");
        assert_eq!(invocation.args, vec![OsString::from("t.mnc"), "s.obj".into(), "s.mnc".into()]);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let invocation = ToolInvocation::new("parmodel-surface-no-such-tool-on-path");
        let error = ProcessRunner.run(&invocation).unwrap_err();
        assert!(matches!(error, ToolError::Spawn { .. }), "{error:?}");
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported() {
        let error = ProcessRunner.run(&ToolInvocation::new("false")).unwrap_err();
        assert!(matches!(error, ToolError::ExitStatus { code: Some(1), .. }), "{error:?}");

        ProcessRunner.run(&ToolInvocation::new("true")).expect("true succeeds");
    }
}
