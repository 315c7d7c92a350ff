//! Purpose: Views over the module summary: static imports and exports, dynamic imports,
//! and `import.meta` uses.
//! Exports: `EcmaScriptModule` and its entry records and name unions.
//! Role: Reached from `RawTransferData.module`; nothing here is visitable.

use crate::ast::Span;
use crate::ast::codec::{Inline, Opt, Seq, Str};
use crate::core::error::Error;

define_views! { 'a;
    /// A name plus the span it was written at.
    record NameSpan [24, niche = crate::ast::layout::Sentinel::NullPointer { offset: 8 }] {
        start @ 0: u32,
        end @ 4: u32,
    } {
        value @ 8: Str,
    }

    record SourceSpan [8] {
        start @ 0: u32,
        end @ 4: u32,
    } {}

    record ImportEntry [96] {
        is_type as "isType" @ 88: bool,
    } {
        import_name as "importName" @ 32: ImportImportName<'a>,
        local_name as "localName" @ 64: Inline<NameSpan<'a>>,
    }

    record ExportEntry [144] {
        start @ 0: u32,
        end @ 4: u32,
        is_type as "isType" @ 136: bool,
    } {
        module_request as "moduleRequest" @ 16: Opt<Inline<NameSpan<'a>>>,
        import_name as "importName" @ 40: ExportImportName<'a>,
        export_name as "exportName" @ 72: ExportExportName<'a>,
        local_name as "localName" @ 104: ExportLocalName<'a>,
    }

    /// One `import ... from "x"` statement.
    record StaticImport [56] {
        start @ 0: u32,
        end @ 4: u32,
    } {
        module_request as "moduleRequest" @ 8: Inline<NameSpan<'a>>,
        entries @ 32: Seq<Inline<ImportEntry<'a>>, 96>,
    }

    record StaticExport [32] {
        start @ 0: u32,
        end @ 4: u32,
    } {
        entries @ 8: Seq<Inline<ExportEntry<'a>>, 144>,
    }

    /// `import(x)`; `module_request` spans the argument.
    record DynamicImport [16] {
        start @ 0: u32,
        end @ 4: u32,
    } {
        module_request as "moduleRequest" @ 8: Inline<SourceSpan<'a>>,
    }

    record EcmaScriptModule [104] {
        has_module_syntax as "hasModuleSyntax" @ 96: bool,
    } {
        static_imports as "staticImports" @ 0: Seq<Inline<StaticImport<'a>>, 56>,
        static_exports as "staticExports" @ 24: Seq<Inline<StaticExport<'a>>, 32>,
        dynamic_imports as "dynamicImports" @ 48: Seq<Inline<DynamicImport<'a>>, 16>,
        import_metas as "importMetas" @ 72: Seq<Inline<SourceSpan<'a>>, 8>,
    }
}

define_unions! { 'a;
    union ImportImportName [] {
        0 => Name(inline NameSpan),
        1 => NamespaceObject,
        2 => Default(inline SourceSpan),
    }

    union ExportImportName [] {
        0 => Name(inline NameSpan),
        1 => All,
        2 => AllButDefault,
        3 => Null,
    }

    union ExportExportName [] {
        0 => Name(inline NameSpan),
        1 => Default(inline SourceSpan),
        2 => Null,
    }

    union ExportLocalName [] {
        0 => Name(inline NameSpan),
        1 => Default(inline NameSpan),
        2 => Null,
    }
}

impl<'a> NameSpan<'a> {
    pub fn span(&self) -> Result<Span, Error> {
        Ok(Span::new(self.start()?, self.end()?))
    }
}

impl<'a> SourceSpan<'a> {
    pub fn span(&self) -> Result<Span, Error> {
        Ok(Span::new(self.start()?, self.end()?))
    }
}

impl<'a> StaticImport<'a> {
    /// Specifier string of the import, e.g. `"./dep.js"` without quotes.
    pub fn specifier(&self) -> Result<&'a str, Error> {
        self.module_request()?.value().copied()
    }
}

impl<'a> EcmaScriptModule<'a> {
    /// Every module specifier this module depends on statically, in source order.
    pub fn requested_modules(&self) -> Result<Vec<&'a str>, Error> {
        let mut out = Vec::new();
        for import in self.static_imports()? {
            out.push(import.specifier()?);
        }
        for export in self.static_exports()? {
            for entry in export.entries()? {
                if let Some(request) = entry.module_request()? {
                    out.push(*request.value()?);
                }
            }
        }
        Ok(out)
    }
}
