use darling::{FromDeriveInput, FromField, ast::Data, util::Ignored};
use proc_macro2::{Ident, TokenStream};
use quote::quote;
use syn::{DeriveInput, Generics, LitStr, Path, Type, ext::IdentExt};

/// Container options: `#[record(name = "...", render_with = "...")]`.
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(record), supports(struct_named))]
struct RecordOpts {
    /// The struct name.
    ident: Ident,
    /// The struct generics, forwarded to the impl.
    generics: Generics,
    /// The named fields.
    data: Data<Ignored, RecordFieldOpts>,
    /// Overrides `Record::NAME`.
    #[darling(default)]
    name: Option<String>,
    /// A function replacing the generated stringifier.
    #[darling(default)]
    render_with: Option<Path>,
}

/// Field options: `#[record(format = "...", nested, rename = "...", skip)]`.
#[derive(Debug, FromField)]
#[darling(attributes(record))]
struct RecordFieldOpts {
    /// The field name; always present for named structs.
    ident: Option<Ident>,
    /// The field type, needed to name a nested record type.
    ty: Type,
    /// The scalar formatting hint.
    #[darling(default)]
    format: Option<LitStr>,
    /// Marks a field holding another record.
    #[darling(default)]
    nested: bool,
    /// The key segment to use instead of the field name.
    #[darling(default)]
    rename: Option<String>,
    /// Leaves the field out entirely.
    #[darling(default)]
    skip: bool,
}

/// The generated pieces for one field.
struct FieldCodegen {
    /// The `FieldDescriptor` table entry.
    descriptor: TokenStream,
    /// The statement handing the field to the visitor.
    visit: TokenStream,
}

impl RecordFieldOpts {
    /// Generates the descriptor and visit statement, or `None` for skipped
    /// fields.
    fn codegen(&self) -> darling::Result<Option<FieldCodegen>> {
        if self.skip {
            return Ok(None);
        }
        let ident = self
            .ident
            .as_ref()
            .ok_or_else(|| darling::Error::unsupported_shape("tuple field"))?;
        let name = match &self.rename {
            Some(rename) => rename.clone(),
            None => ident.unraw().to_string(),
        };
        let ty = &self.ty;

        if self.nested {
            if let Some(format) = &self.format {
                return Err(
                    darling::Error::custom("a nested record field cannot have a format")
                        .with_span(format),
                );
            }
            return Ok(Some(FieldCodegen {
                descriptor: quote! {
                    ::dotlog::FieldDescriptor::nested(#name, <#ty as ::dotlog::Record>::NAME)
                },
                visit: quote! {
                    visitor.nested(#name, &self.#ident)?;
                },
            }));
        }

        let format = match &self.format {
            Some(format) => format.clone(),
            None => LitStr::new("{}", ident.span()),
        };
        Ok(Some(FieldCodegen {
            descriptor: quote! {
                ::dotlog::FieldDescriptor::scalar(#name, #format)
            },
            visit: quote! {
                visitor.scalar(#name, ::core::format_args!(#format, self.#ident))?;
            },
        }))
    }
}

/// Expands `#[derive(Record)]` on `ast`.
pub(crate) fn expand(ast: &DeriveInput) -> darling::Result<TokenStream> {
    let opts = RecordOpts::from_derive_input(ast)?;
    let RecordOpts {
        ident,
        generics,
        data,
        name,
        render_with,
    } = opts;

    let fields = data
        .take_struct()
        .ok_or_else(|| darling::Error::unsupported_shape("enum"))?;

    let mut errors = darling::Error::accumulator();
    let codegen: Vec<FieldCodegen> = fields
        .fields
        .iter()
        .filter_map(|field| errors.handle(field.codegen()).flatten())
        .collect();
    errors.finish()?;

    let record_name = name.unwrap_or_else(|| ident.unraw().to_string());
    let descriptors = codegen.iter().map(|field| &field.descriptor);
    let visits = codegen.iter().map(|field| &field.visit);

    let render_to = render_with.map(|path| {
        quote! {
            fn render_to(
                &self,
                out: &mut ::dotlog::Renderer<'_>,
            ) -> ::core::result::Result<(), ::dotlog::RenderError> {
                #path(self, out)
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::dotlog::Record for #ident #ty_generics #where_clause {
            const NAME: &'static str = #record_name;
            const FIELDS: &'static [::dotlog::FieldDescriptor] = &[#(#descriptors),*];

            #[allow(unused_variables)]
            fn visit_fields<V>(&self, visitor: &mut V) -> ::core::result::Result<(), V::Error>
            where
                V: ::dotlog::FieldVisitor,
            {
                #(#visits)*
                ::core::result::Result::Ok(())
            }

            #render_to
        }
    })
}
