//! Purpose: Canned transfer buffers laid out exactly as the producer writes them.
//! Exports: `write_const_program`, `const_program_source`.
//! Role: Backs `rawtree sample` and the decode tests; a stand-in for a real parse.

use crate::ast::js::{
    BindingIdentifier, NumericLiteral, VariableDeclaration, VariableDeclarator,
};
use crate::ast::root::RawTransferData;
use crate::core::error::{Error, ErrorKind};
use crate::core::writer::BufferWriter;

// Discriminants and enum bytes used by the fixture.
const STATEMENT_VARIABLE_DECLARATION: u8 = 32;
const EXPRESSION_NUMERIC_LITERAL: u8 = 2;
const BINDING_IDENTIFIER: u8 = 0;
const KIND_CONST: u8 = 2;
const MODULE_KIND_MODULE: u8 = 1;

/// Source text of `const <name> = <value>;`.
pub fn const_program_source(name: &str, value: f64) -> Result<String, Error> {
    if !is_identifier(name) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("`{name}` is not a plain identifier"))
            .with_hint("Use ASCII letters, digits, `_` or `$`, not starting with a digit."));
    }
    if !value.is_finite() || value.is_sign_negative() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("`{value}` is not a non-negative finite number")));
    }
    Ok(format!("const {name} = {value};"))
}

/// Writes `const <name> = <value>;` into `bytes` and returns the source text.
///
/// The buffer holds one `VariableDeclaration` with one declarator, no comments, an empty
/// module record, and no diagnostics.
pub fn write_const_program(bytes: &mut [u8], name: &str, value: f64) -> Result<String, Error> {
    let source = const_program_source(name, value)?;
    let len = source.len() as u32;
    let name_start = "const ".len() as u32;
    let name_len = name.len() as u32;
    let value_start = name_start + name_len + " = ".len() as u32;
    let value_len = len - 1 - value_start;

    let mut w = BufferWriter::new(bytes, &source)?;
    let root = w.alloc(RawTransferData::SIZE)?;

    // Program record, inline at the start of the root.
    let program = root;
    w.put_span(program, 0, len)?;
    w.put_u8(program + 125, MODULE_KIND_MODULE)?;
    w.alloc_vec(program + 72, 72, 0)?;
    let statement = w.alloc_vec(program + 96, 16, 1)?;

    let declaration = w.alloc(VariableDeclaration::SIZE)?;
    w.put_span(declaration, 0, len)?;
    w.put_u8(declaration + 32, KIND_CONST)?;
    w.put_union(statement, STATEMENT_VARIABLE_DECLARATION, declaration)?;

    let declarator = w.alloc_vec(declaration + 8, VariableDeclarator::SIZE, 1)?;
    w.put_span(declarator, name_start, len - 1)?;

    let binding = w.alloc(BindingIdentifier::SIZE)?;
    w.put_span(binding, name_start, name_start + name_len)?;
    w.put_source_str(binding + 8, name_start, name_len)?;
    // BindingPattern: kind union at +0, `optional` false at +24.
    w.put_union(declarator + 8, BINDING_IDENTIFIER, binding)?;

    let literal = w.alloc(NumericLiteral::SIZE)?;
    w.put_span(literal, value_start, value_start + value_len)?;
    w.put_f64(literal + 8, value)?;
    w.put_source_str(literal + 16, value_start, value_len)?;
    w.put_union(declarator + 40, EXPRESSION_NUMERIC_LITERAL, literal)?;

    w.alloc_vec(root + 128, 16, 0)?;
    w.alloc_vec(root + 256, 80, 0)?;
    tracing::debug!(root, used = w.used(), source = %source, "wrote const program fixture");
    w.finish(root)?;
    Ok(source)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
