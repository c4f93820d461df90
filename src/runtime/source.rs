//! Bytecode and call-data resolution.
//!
//! Code can come from an inline hex flag, a hex file (or stdin), or an
//! assembly source compiled on the fly. The candidates are kept as an ordered
//! list of [`CodeSource`]s so the precedence is visible in one place and can be
//! exercised without running anything.

use crate::{asm, Result, RunError};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Path value that makes `--codefile` read from standard input.
pub const STDIN_SENTINEL: &str = "-";

/// One place bytecode may be taken from, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeSource {
    /// Hex passed directly on the command line.
    Inline(String),
    /// Hex read from a file, or from stdin for [`STDIN_SENTINEL`].
    HexFile(PathBuf),
    /// Assembly source compiled with [`asm::compile`].
    Assembly(PathBuf),
}

impl CodeSource {
    fn load(&self, stdin: &mut dyn Read) -> Result<Vec<u8>> {
        match self {
            CodeSource::Inline(hex) => decode_hex(hex.as_bytes()),
            CodeSource::HexFile(path) if path.as_os_str() == STDIN_SENTINEL => {
                let mut raw = Vec::new();
                stdin.read_to_end(&mut raw).map_err(|source| RunError::Load {
                    what: "code",
                    origin: "stdin".to_string(),
                    source,
                })?;
                decode_hex(&raw)
            }
            CodeSource::HexFile(path) => decode_hex(&read_file("code", path)?),
            CodeSource::Assembly(path) => {
                let raw = read_file("source", path)?;
                let src = String::from_utf8_lossy(&raw);
                let bin = asm::compile(&src)?;
                Ok(hex::decode(bin)?)
            }
        }
    }
}

/// Resolves the bytecode to run.
///
/// The first source in the list is decisive; an empty list means "no code",
/// leaving whatever the state already holds at the receiver in effect.
#[derive(Debug, Clone, Default)]
pub struct CodeResolver {
    sources: Vec<CodeSource>,
}

impl CodeResolver {
    /// Build the precedence list from raw flag values. Empty strings count as
    /// "not supplied".
    pub fn from_flags(code: Option<&str>, codefile: Option<&str>, source: Option<&Path>) -> Self {
        let mut sources = Vec::new();
        if let Some(code) = code.filter(|c| !c.is_empty()) {
            sources.push(CodeSource::Inline(code.to_string()));
        }
        if let Some(file) = codefile.filter(|f| !f.is_empty()) {
            sources.push(CodeSource::HexFile(PathBuf::from(file)));
        }
        // Compiled source only applies when no hex code was given at all.
        if sources.is_empty() {
            if let Some(path) = source.filter(|p| !p.as_os_str().is_empty()) {
                sources.push(CodeSource::Assembly(path.to_path_buf()));
            }
        }
        Self { sources }
    }

    pub fn sources(&self) -> &[CodeSource] {
        &self.sources
    }

    /// Resolve using the process's standard input for the stdin sentinel.
    pub fn resolve(&self) -> Result<Vec<u8>> {
        self.resolve_with_stdin(&mut std::io::stdin().lock())
    }

    pub fn resolve_with_stdin(&self, stdin: &mut dyn Read) -> Result<Vec<u8>> {
        match self.sources.first() {
            Some(source) => {
                debug!(?source, "resolving code");
                source.load(stdin)
            }
            None => Ok(Vec::new()),
        }
    }
}

/// Where call data is taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    HexFile(PathBuf),
    Inline(String),
}

/// Resolves call data: an input file wins over the inline flag.
#[derive(Debug, Clone)]
pub struct InputResolver {
    source: InputSource,
}

impl InputResolver {
    pub fn from_flags(inputfile: Option<&Path>, input: &str) -> Self {
        let source = match inputfile.filter(|p| !p.as_os_str().is_empty()) {
            Some(path) => InputSource::HexFile(path.to_path_buf()),
            None => InputSource::Inline(input.to_string()),
        };
        Self { source }
    }

    pub fn source(&self) -> &InputSource {
        &self.source
    }

    pub fn resolve(&self) -> Result<Vec<u8>> {
        match &self.source {
            InputSource::HexFile(path) => decode_hex(&read_file("input", path)?),
            InputSource::Inline(hex) => decode_hex(hex.as_bytes()),
        }
    }
}

/// Trim, check even length, strip an optional `0x` prefix and decode.
///
/// The length check runs on the trimmed text *including* any prefix, so
/// `0x123` is rejected rather than silently padded.
pub fn decode_hex(raw: &[u8]) -> Result<Vec<u8>> {
    let trimmed = raw.trim_ascii();
    if trimmed.len() % 2 != 0 {
        return Err(RunError::OddHexLength(trimmed.len()));
    }
    let digits = trimmed
        .strip_prefix(b"0x")
        .or_else(|| trimmed.strip_prefix(b"0X"))
        .unwrap_or(trimmed);
    Ok(hex::decode(digits)?)
}

fn read_file(what: &'static str, path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|source| RunError::Load {
        what,
        origin: path.display().to_string(),
        source,
    })
}
