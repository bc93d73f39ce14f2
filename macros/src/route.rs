use darling::{ast::NestedMeta, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as Tokens;
use quote::{format_ident, quote};

#[derive(FromMeta)]
struct RouteArgs {
	#[darling(multiple)]
	tag: Vec<syn::Expr>,
	/// Roles allowed to call the route. Listed at the end of the description.
	#[darling(multiple)]
	role: Vec<String>,
	#[darling(multiple)]
	response: Vec<ResponseArgs>,
}

#[derive(FromMeta)]
struct ResponseArgs {
	status: syn::LitInt,
	shape: Option<syn::Type>,
	description: Option<String>,
}

impl ResponseArgs {
	fn transform(&self) -> Tokens {
		let status = &self.status;
		let shape = self.shape.as_ref().map_or_else(|| quote!(()), |shape| quote!(#shape));

		match &self.description {
			Some(description) => quote! {
				.response_with::<#status, #shape, _>(|res| res.description(#description))
			},
			None => quote! {
				.response::<#status, #shape>()
			},
		}
	}
}

/// A doc comment split into its first line and the lines after it.
struct Docs {
	summary: String,
	description: String,
}

impl Docs {
	fn parse(function: &syn::ItemFn) -> syn::Result<Self> {
		let lines = function
			.attrs
			.iter()
			.filter(|attr| attr.path().is_ident("doc"))
			.filter_map(|attr| match &attr.meta {
				syn::Meta::NameValue(syn::MetaNameValue {
					value:
						syn::Expr::Lit(syn::ExprLit {
							lit: syn::Lit::Str(text),
							..
						}),
					..
				}) => Some(text.value().trim().to_owned()),
				_ => None,
			})
			.collect::<Vec<_>>();

		let mut lines = lines.iter().skip_while(|line| line.is_empty());

		let summary = lines.next().cloned().ok_or_else(|| {
			syn::Error::new(
				function.sig.ident.span(),
				"routes need a doc comment, its first line is the summary",
			)
		})?;
		let description = lines
			.map(String::as_str)
			.collect::<Vec<_>>()
			.join("\n")
			.trim()
			.to_owned();

		Ok(Self {
			summary,
			description,
		})
	}

	fn with_roles(mut self, roles: &[String]) -> Self {
		if roles.is_empty() {
			return self;
		}

		if !self.description.is_empty() {
			self.description.push_str("\n\n");
		}

		self.description
			.push_str(&format!("Allowed roles: {}.", roles.join(", ")));
		self
	}
}

pub fn from_input(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = match NestedMeta::parse_meta_list(args.into())
		.map_err(darling::Error::from)
		.and_then(|list| RouteArgs::from_list(&list))
	{
		Ok(args) => args,
		Err(error) => return error.write_errors().into(),
	};

	let function = syn::parse_macro_input!(input as syn::ItemFn);
	let docs = match Docs::parse(&function) {
		Ok(docs) => docs.with_roles(&args.role),
		Err(error) => return error.into_compile_error().into(),
	};

	let fn_name = format_ident!("{}_docs", function.sig.ident);
	let fn_vis = &function.vis;

	let summary = docs.summary;
	let description = (!docs.description.is_empty()).then(|| {
		let description = docs.description;
		quote!(.description(#description))
	});
	let tags = args.tag.iter();
	let responses = args.response.iter().map(ResponseArgs::transform);

	quote! {
		#function

		#fn_vis fn #fn_name(op: aide::transform::TransformOperation) -> aide::transform::TransformOperation {
			op.summary(#summary)
				#description
				#(
					.tag(#tags)
				)*
				#(
					#responses
				)*
		}
	}
	.into()
}
