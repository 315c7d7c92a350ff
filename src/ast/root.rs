//! Purpose: The root record reached from the metadata slot, plus comments and diagnostics.
//! Exports: `RawTransferData`, `Comment`, `Diagnostic`, `ErrorLabel`.
//! Role: Entry points of a decoded transfer; `RawTransfer::program()` and friends start here.

use crate::ast::codec::{Codec, Inline, Opt, Seq, Str};
use crate::ast::enums::{CommentKind, ErrorSeverity};
use crate::ast::js::Program;
use crate::ast::module_record::EcmaScriptModule;
use crate::ast::Span;
use crate::core::error::{Error, ErrorKind};
use crate::core::raw::RawTransfer;

const PROGRAM: u32 = 0;
const COMMENTS: u32 = 128;
const MODULE: u32 = 152;
const ERRORS: u32 = 256;

type Comments<'a> = Seq<Inline<Comment<'a>>, 16>;
type Diagnostics<'a> = Seq<Inline<Diagnostic<'a>>, 80>;

define_views! { 'a;
    record RawTransferData [280] {} {
        program @ 0: Inline<Program<'a>>,
        comments @ 128: Comments<'a>,
        module @ 152: Inline<EcmaScriptModule<'a>>,
        errors @ 256: Diagnostics<'a>,
    }

    record Comment [16] {
        start @ 0: u32,
        end @ 4: u32,
        kind as "type" @ 12: CommentKind,
    } {}

    /// A parse error or warning reported by the producer.
    record Diagnostic [80] {
        severity @ 72: ErrorSeverity,
    } {
        message @ 0: Str,
        labels @ 16: Seq<Inline<ErrorLabel<'a>>, 24>,
        help_message as "helpMessage" @ 40: Opt<Str>,
        codeframe @ 56: Str,
    }

    record ErrorLabel [24] {
        start @ 0: u32,
        end @ 4: u32,
    } {
        message @ 8: Opt<Str>,
    }
}

impl<'a> Comment<'a> {
    pub fn span(&self) -> Result<Span, Error> {
        Ok(Span::new(self.start()?, self.end()?))
    }

    /// Comment body without its `//` or `/* */` delimiters.
    pub fn text(&self) -> Result<&'a str, Error> {
        let (open, close) = self.kind()?.delimiters();
        let span = self.span()?;
        let body = Span::new(span.start + open, span.end.saturating_sub(close));
        body.source_text(self.transfer().source_text()).ok_or_else(|| {
            Error::new(ErrorKind::Bounds)
                .with_message(format!(
                    "comment {}..{} is outside the source text",
                    span.start, span.end
                ))
                .with_offset(self.pos() as u64)
        })
    }
}

impl<'a> ErrorLabel<'a> {
    pub fn span(&self) -> Result<Span, Error> {
        Ok(Span::new(self.start()?, self.end()?))
    }
}

impl RawTransfer {
    /// The root record.
    pub fn data(&self) -> RawTransferData<'_> {
        RawTransferData::new(self, self.data_pos())
    }

    pub fn program(&self) -> Program<'_> {
        // The program sits at the root offset itself.
        Program::new(self, self.data_pos() + PROGRAM)
    }

    pub fn comments(&self) -> Result<Vec<Comment<'_>>, Error> {
        Comments::decode(self, self.locate(self.data_pos(), COMMENTS)?)
    }

    /// The module record. A root too close to the end of a corrupt buffer yields a view
    /// whose reads fail with `Bounds`.
    pub fn module(&self) -> EcmaScriptModule<'_> {
        EcmaScriptModule::new(self, self.data_pos().saturating_add(MODULE))
    }

    pub fn errors(&self) -> Result<Vec<Diagnostic<'_>>, Error> {
        Diagnostics::decode(self, self.locate(self.data_pos(), ERRORS)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ToRecord;
    use crate::core::raw::decode;
    use crate::core::writer::BufferWriter;
    use serde_json::json;

    fn transfer(source: &str, fill: impl FnOnce(&mut BufferWriter<'_>, u32)) -> RawTransfer {
        let mut bytes = vec![0u8; 4096];
        let mut w = BufferWriter::new(&mut bytes, source).expect("writer");
        let root = w.alloc(RawTransferData::SIZE).expect("root");
        w.alloc_vec(root + 96, 16, 0).expect("body");
        w.alloc_vec(root + 72, 72, 0).expect("directives");
        fill(&mut w, root);
        w.finish(root).expect("finish");
        decode(bytes, source).expect("decode")
    }

    #[test]
    fn comments_expose_kind_and_body() {
        let source = "// hi\n/* there */";
        let ast = transfer(source, |w, root| {
            let comments = w.alloc_vec(root + COMMENTS, 16, 2).expect("comments");
            w.put_span(comments, 0, 5).expect("line");
            w.put_u8(comments + 12, 0).expect("kind");
            w.put_span(comments + 16, 6, 17).expect("block");
            w.put_u8(comments + 28, 1).expect("kind");
        });
        let comments = ast.comments().unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].kind().unwrap(), CommentKind::Line);
        assert_eq!(comments[0].text().unwrap(), " hi");
        assert_eq!(comments[1].text().unwrap(), " there ");
        assert_eq!(
            comments[1].to_record().unwrap(),
            json!({"type": "Block", "start": 6, "end": 17, "value": " there "})
        );
    }

    #[test]
    fn diagnostics_decode_labels_and_help() {
        let source = "let 1";
        let ast = transfer(source, |w, root| {
            let error = w.alloc_vec(root + ERRORS, 80, 1).expect("errors");
            w.put_str(error, "Unexpected token").expect("message");
            let label = w.alloc_vec(error + 16, 24, 1).expect("labels");
            w.put_span(label, 4, 5).expect("label span");
            w.put_tag(error + 72, 0).expect("severity");
            w.put_str(error + 56, "> 1 | let 1").expect("codeframe");
        });
        let errors = ast.errors().unwrap();
        let error = &errors[0];
        assert_eq!(*error.message().unwrap(), "Unexpected token");
        assert_eq!(error.severity().unwrap(), ErrorSeverity::Error);
        assert!(error.help_message().unwrap().is_none());
        let labels = error.labels().unwrap();
        assert_eq!(labels[0].span().unwrap(), Span::new(4, 5));
        assert!(labels[0].message().unwrap().is_none());
    }

    #[test]
    fn root_near_buffer_end_fails_with_bounds() {
        let mut bytes = vec![0u8; 1024];
        bytes[1008..1012].copy_from_slice(&1000u32.to_le_bytes());
        let ast = decode(bytes, "").expect("decode");
        assert_eq!(ast.comments().expect_err("comments").kind(), ErrorKind::Bounds);
        assert_eq!(ast.errors().expect_err("errors").kind(), ErrorKind::Bounds);
        assert_eq!(ast.program().body().expect_err("body").kind(), ErrorKind::Bounds);
        assert!(ast.module().has_module_syntax().is_err());
        assert!(ast.data().to_record().is_err());
    }

    #[test]
    fn views_at_wrapping_offsets_fail_with_bounds() {
        let ast = transfer("", |_, _| {});
        let program = Program::new(&ast, u32::MAX - 4);
        assert_eq!(program.body().expect_err("body").kind(), ErrorKind::Bounds);
        assert_eq!(program.end().expect_err("end").kind(), ErrorKind::Bounds);
        assert_eq!(program.span().expect_err("span").kind(), ErrorKind::Bounds);
        let mut visitor = crate::traverse::Visitor::new();
        visitor.on_enter(crate::ast::NodeType::IdentifierReference, |_| Ok(()));
        let err = crate::traverse::traverse(&program, &mut visitor).expect_err("walk");
        assert_eq!(err.kind(), ErrorKind::Bounds);
    }

    #[test]
    fn root_snapshot_has_every_section() {
        let ast = transfer("", |_, _| {});
        assert_eq!(ast.program().pos(), ast.data_pos());
        let record = ast.data().to_record().unwrap();
        assert_eq!(record["program"]["type"], json!("Program"));
        assert_eq!(record["program"]["body"], json!([]));
        assert_eq!(record["comments"], json!([]));
        assert_eq!(record["errors"], json!([]));
        assert_eq!(record["module"]["staticImports"], json!([]));
        assert_eq!(record["module"]["hasModuleSyntax"], json!(false));
    }
}
