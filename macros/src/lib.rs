mod model;
mod route;

use proc_macro::TokenStream;

/// Creates a new documentation function for the route, named after the original function with the suffix `_docs`.
/// The first line of the doc comment becomes the summary and the remaining lines the description.
///
/// Arguments: `tag = <expr>`, `role = "<role>"` (listed in the description) and
/// `response(status = <u16>, shape = "<type>", description = "<text>")`, each repeatable.
#[proc_macro_attribute]
pub fn route(args: TokenStream, input: TokenStream) -> TokenStream {
	route::from_input(args, input)
}

/// Creates the input structs `CreateX` and `UpdateX` for the model `X`.
/// `#[model(create)]` or `#[model(update)]` limits generation to one of them.
/// Fields with #[serde(skip_deserializing)] are left out, and all other fields
/// are included verbatim (including attributes). Update fields are wrapped in `Option`.
#[proc_macro_attribute]
pub fn model(args: TokenStream, input: TokenStream) -> TokenStream {
	model::from_input(args, input)
}
