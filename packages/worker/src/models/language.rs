use std::path::Path;

use common::Language;

use crate::config::ExecutionConfig;

/// Base name of the source file and compiled binary inside an artifact directory.
const ARTIFACT_STEM: &str = "main";

/// Program plus argument vector. Never passed through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    fn new(program: impl Into<String>, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().collect(),
        }
    }
}

/// How to build and run one language inside an artifact directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageDescriptor {
    pub source_file: String,
    pub compile: Option<CommandLine>,
    pub run: CommandLine,
}

/// Toolchain executables, taken from configuration.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub cpp_compiler: String,
    pub python_bin: String,
    pub node_bin: String,
}

impl From<&ExecutionConfig> for Toolchain {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            cpp_compiler: config.cpp_compiler.clone(),
            python_bin: config.python_bin.clone(),
            node_bin: config.node_bin.clone(),
        }
    }
}

fn file_extension(language: Language) -> &'static str {
    match language {
        Language::Cpp => "cpp",
        Language::Python => "py",
        Language::Javascript => "js",
    }
}

impl Toolchain {
    /// Descriptor for `language` with paths rooted at `dir`.
    pub fn descriptor(&self, language: Language, dir: &Path) -> LanguageDescriptor {
        let source_file = format!("{ARTIFACT_STEM}.{}", file_extension(language));
        let source = dir.join(&source_file).to_string_lossy().into_owned();

        let (compile, run) = match language {
            Language::Cpp => {
                let binary = dir.join(ARTIFACT_STEM).to_string_lossy().into_owned();
                (
                    Some(CommandLine::new(
                        &self.cpp_compiler,
                        [
                            "-O2".to_string(),
                            "-std=c++17".to_string(),
                            "-o".to_string(),
                            binary.clone(),
                            source,
                        ],
                    )),
                    CommandLine::new(binary, Vec::<String>::new()),
                )
            }
            Language::Python => (None, CommandLine::new(&self.python_bin, [source])),
            Language::Javascript => (None, CommandLine::new(&self.node_bin, [source])),
        };

        LanguageDescriptor {
            source_file,
            compile,
            run,
        }
    }
}
