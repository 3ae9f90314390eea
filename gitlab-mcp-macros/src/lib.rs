//! Procedural macros for gitlab-mcp
//!
//! This crate provides the `#[gitlab_tool]` attribute macro used by every tool
//! definition in the server. It works on two shapes of input type:
//!
//! - a struct with named fields: a single-purpose tool with one operation type
//! - an enum tagged by `action`: a consolidated tool where each variant is one
//!   action and carries its own `#[action(read|write|delete|execute)]` marker

use darling::{FromMeta, ast::NestedMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, DeriveInput, Ident, parse_macro_input};

/// Arguments for the `#[gitlab_tool]` attribute
#[derive(Debug, FromMeta)]
struct GitLabToolArgs {
    /// Tool name (e.g., "browse_projects")
    name: String,
    /// Tool description for MCP
    description: String,
    /// Entity the tool belongs to (e.g., "milestones")
    entity: String,
    /// Operation type for single-purpose tools: "read", "write", "delete" or "execute"
    #[darling(default)]
    operation: Option<String>,
}

/// Attribute macro for GitLab MCP tools.
///
/// Generates:
/// - `#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]`
/// - a `ToolInfo` implementation (name, description, entity, shape)
/// - an `ActionScoped` implementation reporting the selected action and its operation
///
/// # Example
///
/// ```ignore
/// #[gitlab_tool(
///     name = "browse_releases",
///     description = "List or inspect project releases",
///     entity = "releases"
/// )]
/// #[serde(tag = "action", rename_all = "snake_case")]
/// pub enum BrowseReleases {
///     /// List releases of a project
///     #[action(read)]
///     List { project_id: String },
///     /// Get a release by tag
///     #[action(read)]
///     Get { project_id: String, tag_name: String },
/// }
/// ```
#[proc_macro_attribute]
pub fn gitlab_tool(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.to_compile_error()),
    };

    let args = match GitLabToolArgs::from_list(&attr_args) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.write_errors()),
    };

    let input = parse_macro_input!(item as DeriveInput);
    let expanded = impl_gitlab_tool(&args, input);

    TokenStream::from(expanded)
}

fn impl_gitlab_tool(args: &GitLabToolArgs, mut input: DeriveInput) -> TokenStream2 {
    let struct_name = input.ident.clone();
    let tool_name = &args.name;
    let description = &args.description;

    let entity_variant = match args.entity.as_str() {
        "core" => quote! { crate::catalog::Entity::Core },
        "milestones" => quote! { crate::catalog::Entity::Milestones },
        "workitems" => quote! { crate::catalog::Entity::WorkItems },
        "releases" => quote! { crate::catalog::Entity::Releases },
        "variables" => quote! { crate::catalog::Entity::Variables },
        "webhooks" => quote! { crate::catalog::Entity::Webhooks },
        "refs" => quote! { crate::catalog::Entity::Refs },
        "integrations" => quote! { crate::catalog::Entity::Integrations },
        "files" => quote! { crate::catalog::Entity::Files },
        other => {
            return syn::Error::new_spanned(&input, format!("Unknown entity: {}", other))
                .to_compile_error();
        }
    };

    let (shape, scoped) = match &mut input.data {
        syn::Data::Struct(data) => {
            if !matches!(data.fields, syn::Fields::Named(_)) {
                return syn::Error::new_spanned(
                    &struct_name,
                    "gitlab_tool only supports structs with named fields",
                )
                .to_compile_error();
            }
            let Some(operation) = &args.operation else {
                return syn::Error::new_spanned(
                    &struct_name,
                    "single-purpose tools need `operation = \"read|write|delete|execute\"`",
                )
                .to_compile_error();
            };
            let operation_variant = match operation_tokens(operation) {
                Ok(v) => v,
                Err(msg) => return syn::Error::new_spanned(&struct_name, msg).to_compile_error(),
            };

            let shape = quote! {
                crate::catalog::ToolShape::Single(#operation_variant)
            };
            let scoped = quote! {
                fn action(&self) -> Option<&'static str> {
                    None
                }

                fn operation(&self) -> crate::catalog::OperationType {
                    #operation_variant
                }
            };
            (shape, scoped)
        }
        syn::Data::Enum(data) => {
            if args.operation.is_some() {
                return syn::Error::new_spanned(
                    &struct_name,
                    "action tools declare `#[action(...)]` per variant, not `operation`",
                )
                .to_compile_error();
            }

            let mut specs = Vec::new();
            let mut action_arms = Vec::new();
            let mut operation_arms = Vec::new();

            for variant in data.variants.iter_mut() {
                let operation = match take_action_attr(&mut variant.attrs) {
                    Ok(Some(op)) => op,
                    Ok(None) => {
                        return syn::Error::new_spanned(
                            &variant.ident,
                            "every action variant needs #[action(read|write|delete|execute)]",
                        )
                        .to_compile_error();
                    }
                    Err(e) => return e.to_compile_error(),
                };
                let operation_variant = match operation_tokens(&operation.to_string()) {
                    Ok(v) => v,
                    Err(msg) => {
                        return syn::Error::new_spanned(&operation, msg).to_compile_error();
                    }
                };

                let ident = &variant.ident;
                let action_name = to_snake_case(&ident.to_string());

                specs.push(quote! {
                    crate::catalog::ActionSpec::new(#action_name, #operation_variant)
                });
                action_arms.push(quote! { Self::#ident { .. } => #action_name });
                operation_arms.push(quote! { Self::#ident { .. } => #operation_variant });
            }

            let shape = quote! {
                const ACTIONS: &[crate::catalog::ActionSpec] = &[#(#specs),*];
                crate::catalog::ToolShape::Actions(ACTIONS)
            };
            let scoped = quote! {
                fn action(&self) -> Option<&'static str> {
                    Some(match self {
                        #(#action_arms,)*
                    })
                }

                fn operation(&self) -> crate::catalog::OperationType {
                    match self {
                        #(#operation_arms,)*
                    }
                }
            };
            (shape, scoped)
        }
        syn::Data::Union(_) => {
            return syn::Error::new_spanned(&struct_name, "gitlab_tool does not support unions")
                .to_compile_error();
        }
    };

    quote! {
        #[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
        #input

        impl crate::tools::ToolInfo for #struct_name {
            fn name() -> &'static str {
                #tool_name
            }

            fn description() -> &'static str {
                #description
            }

            fn entity() -> crate::catalog::Entity {
                #entity_variant
            }

            fn shape() -> crate::catalog::ToolShape {
                #shape
            }
        }

        impl crate::catalog::ActionScoped for #struct_name {
            #scoped
        }
    }
}

fn operation_tokens(operation: &str) -> Result<TokenStream2, String> {
    match operation {
        "read" => Ok(quote! { crate::catalog::OperationType::Read }),
        "write" => Ok(quote! { crate::catalog::OperationType::Write }),
        "delete" => Ok(quote! { crate::catalog::OperationType::Delete }),
        "execute" => Ok(quote! { crate::catalog::OperationType::Execute }),
        other => Err(format!(
            "Unknown operation: {}. Use: read, write, delete, or execute",
            other
        )),
    }
}

/// Remove the `#[action(...)]` marker from a variant and return its operation.
fn take_action_attr(attrs: &mut Vec<Attribute>) -> syn::Result<Option<Ident>> {
    let mut found = None;
    let mut error = None;

    attrs.retain(|attr| {
        if !attr.path().is_ident("action") {
            return true;
        }
        match attr.parse_args::<Ident>() {
            Ok(op) => found = Some(op),
            Err(e) => error = Some(e),
        }
        false
    });

    match error {
        Some(e) => Err(e),
        None => Ok(found),
    }
}

/// `CreateLink` -> `create_link`, matching serde's `rename_all = "snake_case"`.
fn to_snake_case(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("List"), "list");
        assert_eq!(to_snake_case("CreateLink"), "create_link");
        assert_eq!(to_snake_case("ListProtectedBranches"), "list_protected_branches");
    }
}
