//! A small EVM assembler for the positional `run <SOURCE>` argument.
//!
//! Syntax, one instruction per line:
//!
//! ```text
//! ;; comments start with ';;' or '#'
//! PUSH1 0x2a          ;; explicit width, literal is left-padded
//! PUSH 1000           ;; minimal width
//! loop:               ;; label definition, emits JUMPDEST
//! JUMP(@loop)         ;; pushes the label offset then jumps
//! @loop               ;; pushes the label offset
//! ```
//!
//! Label references are always encoded as `PUSH4`.

use crate::{Result, RunError};
use alloy_primitives::U256;
use revm::interpreter::opcode::{self, OpCode};
use std::collections::HashMap;
use std::sync::OnceLock;

const LABEL_WIDTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Operand {
    Literal(Vec<u8>),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Op(u8),
    Push { width: usize, operand: Operand },
    Label(String),
}

impl Item {
    fn size(&self) -> usize {
        match self {
            Item::Op(_) | Item::Label(_) => 1,
            Item::Push { width, .. } => 1 + width,
        }
    }
}

fn mnemonics() -> &'static HashMap<&'static str, u8> {
    static TABLE: OnceLock<HashMap<&'static str, u8>> = OnceLock::new();
    TABLE.get_or_init(|| {
        (0..=u8::MAX)
            .filter_map(|byte| OpCode::new(byte).map(|op| (op.as_str(), byte)))
            .collect()
    })
}

/// Compile assembly source into a lowercase hex string (no `0x` prefix).
pub fn compile(src: &str) -> Result<String> {
    // (1-based source line, item)
    let mut items: Vec<(usize, Item)> = Vec::new();
    for (idx, raw) in src.lines().enumerate() {
        let line = idx + 1;
        let mut parsed = Vec::new();
        parse_line(raw, &mut parsed).map_err(|message| RunError::Assembler { line, message })?;
        items.extend(parsed.into_iter().map(|item| (line, item)));
    }

    let mut labels = HashMap::new();
    let mut pc = 0usize;
    for (line, item) in &items {
        if let Item::Label(name) = item {
            if labels.insert(name.clone(), pc).is_some() {
                return Err(RunError::Assembler {
                    line: *line,
                    message: format!("label '{}' defined twice", name),
                });
            }
        }
        pc += item.size();
    }

    let mut code = Vec::with_capacity(pc);
    for (line, item) in &items {
        match item {
            Item::Op(op) => code.push(*op),
            Item::Label(_) => code.push(opcode::JUMPDEST),
            Item::Push { width, operand } => {
                let bytes = match operand {
                    Operand::Literal(bytes) => bytes.clone(),
                    Operand::Label(name) => {
                        let target = labels.get(name).ok_or_else(|| RunError::Assembler {
                            line: *line,
                            message: format!("undefined label '{}'", name),
                        })?;
                        (*target as u32).to_be_bytes().to_vec()
                    }
                };
                code.push(opcode::PUSH0 + *width as u8);
                code.extend(std::iter::repeat(0u8).take(width - bytes.len()));
                code.extend_from_slice(&bytes);
            }
        }
    }
    Ok(hex::encode(code))
}

fn parse_line(raw: &str, items: &mut Vec<Item>) -> std::result::Result<(), String> {
    let line = strip_comment(raw).trim();
    if line.is_empty() {
        return Ok(());
    }

    if let Some(name) = line.strip_suffix(':') {
        let name = name.trim();
        if !is_label_name(name) {
            return Err(format!("invalid label name '{}'", name));
        }
        items.push(Item::Label(name.to_string()));
        return Ok(());
    }

    let normalized = line.replace(['(', ')'], " ");
    let mut tokens = normalized.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(());
    };
    let operand = tokens.next();
    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected token '{}'", extra));
    }

    if head.starts_with('@') {
        if operand.is_some() {
            return Err(format!("unexpected operand after '{}'", head));
        }
        items.push(label_push(head)?);
        return Ok(());
    }

    let mnemonic = head.to_ascii_uppercase();
    if mnemonic == "PUSH" {
        let operand = operand.ok_or("PUSH requires an operand")?;
        items.push(match operand.strip_prefix('@') {
            Some(_) => label_push(operand)?,
            None => {
                let bytes = parse_literal(operand)?;
                Item::Push {
                    width: bytes.len(),
                    operand: Operand::Literal(bytes),
                }
            }
        });
        return Ok(());
    }

    let op = *mnemonics()
        .get(mnemonic.as_str())
        .ok_or_else(|| format!("unknown instruction '{}'", head))?;

    if (opcode::PUSH1..=opcode::PUSH32).contains(&op) {
        let width = (op - opcode::PUSH0) as usize;
        let operand = operand.ok_or_else(|| format!("{} requires an operand", mnemonic))?;
        let item = if operand.starts_with('@') {
            if width < LABEL_WIDTH {
                return Err(format!("{} is too narrow for a label", mnemonic));
            }
            match label_push(operand)? {
                Item::Push { operand, .. } => Item::Push { width, operand },
                other => other,
            }
        } else {
            let bytes = parse_literal(operand)?;
            if bytes.len() > width {
                return Err(format!("literal '{}' does not fit in {}", operand, mnemonic));
            }
            Item::Push {
                width,
                operand: Operand::Literal(bytes),
            }
        };
        items.push(item);
        return Ok(());
    }

    match operand {
        None => items.push(Item::Op(op)),
        Some(target) if op == opcode::JUMP || op == opcode::JUMPI => {
            let push = if target.starts_with('@') {
                label_push(target)?
            } else {
                let bytes = parse_literal(target)?;
                Item::Push {
                    width: bytes.len(),
                    operand: Operand::Literal(bytes),
                }
            };
            items.push(push);
            items.push(Item::Op(op));
        }
        Some(extra) => return Err(format!("{} takes no operand, got '{}'", mnemonic, extra)),
    }
    Ok(())
}

fn strip_comment(line: &str) -> &str {
    let cut = [line.find(";;"), line.find('#')]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(line.len());
    &line[..cut]
}

fn is_label_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn label_push(token: &str) -> std::result::Result<Item, String> {
    let name = token.trim_start_matches('@');
    if !is_label_name(name) {
        return Err(format!("invalid label reference '{}'", token));
    }
    Ok(Item::Push {
        width: LABEL_WIDTH,
        operand: Operand::Label(name.to_string()),
    })
}

/// Parse a push literal. Hex keeps its written width, decimal is minimal.
/// Both produce at least one byte.
fn parse_literal(token: &str) -> std::result::Result<Vec<u8>, String> {
    let bytes = if let Some(digits) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        if digits.is_empty() {
            return Err(format!("empty hex literal '{}'", token));
        }
        let padded = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        hex::decode(padded).map_err(|e| format!("invalid hex literal '{}': {}", token, e))?
    } else {
        let value = U256::from_str_radix(token, 10)
            .map_err(|e| format!("invalid literal '{}': {}", token, e))?;
        let full = value.to_be_bytes::<32>();
        let first = full.iter().position(|b| *b != 0).unwrap_or(31);
        full[first..].to_vec()
    };
    if bytes.len() > 32 {
        return Err(format!("literal '{}' is wider than 32 bytes", token));
    }
    Ok(bytes)
}
