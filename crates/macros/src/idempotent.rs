//! `#[idempotent]` attribute implementation.
//!
//! Rewrites the function body into a closure handed to a per-function
//! `static IdempotentFn`, so the runtime can decide at call time whether the
//! body runs once or twice.

use proc_macro::TokenStream;
use proc_macro2::{Group, Ident, TokenStream as TokenStream2, TokenTree};
use quote::{ToTokens, format_ident, quote};
use syn::meta::ParseNestedMeta;
use syn::{FnArg, ItemFn, LitBool, LitStr, Pat, Path, ReturnType, Token, Type, parse_macro_input, parse_quote};

/// Parsed `#[idempotent(...)]` arguments.
#[derive(Default)]
struct IdempotentArgs {
	equal_return: bool,
	enforce_tests: Option<bool>,
	raises: Option<LitStr>,
	krate: Option<Path>,
}

impl IdempotentArgs {
	fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
		if meta.path.is_ident("equal_return") {
			self.equal_return = if meta.input.peek(Token![=]) {
				meta.value()?.parse::<LitBool>()?.value
			} else {
				true
			};
			Ok(())
		} else if meta.path.is_ident("enforce_tests") {
			let lit: LitBool = meta.value()?.parse()?;
			self.enforce_tests = Some(lit.value);
			Ok(())
		} else if meta.path.is_ident("raises") {
			let lit: LitStr = meta.value()?.parse()?;
			if lit.value().is_empty() {
				return Err(meta.error("`raises` needs a non-empty error kind"));
			}
			self.raises = Some(lit);
			Ok(())
		} else if meta.path.is_ident("crate") {
			let value = meta.value()?;
			// Accept both `crate = path` and serde's `crate = "path"`.
			let path = if value.peek(LitStr) {
				value.parse::<LitStr>()?.parse::<Path>()?
			} else {
				value.parse::<Path>()?
			};
			self.krate = Some(path);
			Ok(())
		} else {
			Err(meta.error("unknown idempotent attribute; expected `equal_return`, `enforce_tests`, `raises` or `crate`"))
		}
	}
}

/// Entry point for `#[idempotent]`.
pub fn idempotent(attr: TokenStream, item: TokenStream) -> TokenStream {
	let mut args = IdempotentArgs::default();
	let parser = syn::meta::parser(|meta| args.parse(meta));
	parse_macro_input!(attr with parser);

	let func = parse_macro_input!(item as ItemFn);
	match expand(args, func) {
		Ok(tokens) => tokens.into(),
		Err(e) => e.to_compile_error().into(),
	}
}

fn expand(args: IdempotentArgs, mut func: ItemFn) -> syn::Result<TokenStream2> {
	if let Some(asyncness) = &func.sig.asyncness {
		return Err(syn::Error::new_spanned(asyncness, "#[idempotent] does not support async functions"));
	}
	if let Some(constness) = &func.sig.constness {
		return Err(syn::Error::new_spanned(constness, "#[idempotent] does not support const functions"));
	}
	if args.equal_return
		&& let Some(raises) = &args.raises
	{
		return Err(syn::Error::new_spanned(raises, "`equal_return` and `raises` cannot be combined"));
	}

	let krate = args.krate.unwrap_or_else(|| parse_quote!(::recheck));
	let name = func.sig.ident.clone();

	let mut descriptor = quote! {
		#krate::IdempotentFn::new(::core::concat!(::core::module_path!(), "::", ::core::stringify!(#name)))
	};
	if args.equal_return {
		descriptor = quote! { #descriptor.equal_return(true) };
	}
	match args.enforce_tests {
		Some(true) => descriptor = quote! { #descriptor.enforcement(#krate::EnforcementMode::ForceOn) },
		Some(false) => descriptor = quote! { #descriptor.enforcement(#krate::EnforcementMode::ForceOff) },
		None => {}
	}
	if let Some(kind) = &args.raises {
		descriptor = quote! { #descriptor.raises(#kind) };
	}

	let entry = if args.raises.is_some() {
		format_ident!("try_call")
	} else if args.equal_return {
		format_ident!("call_eq")
	} else {
		format_ident!("call")
	};

	let rebinds = rebind_owned_params(&mut func);
	let ret = closure_return(&func.sig.output);
	let block = if owns_receiver(&func) {
		rename_self(func.block.to_token_stream())
	} else {
		func.block.to_token_stream()
	};
	let attrs = &func.attrs;
	let vis = &func.vis;
	let sig = &func.sig;

	Ok(quote! {
		#(#attrs)*
		#vis #sig {
			static __RECHECK_IDEMPOTENT: #krate::IdempotentFn = #descriptor;
			__RECHECK_IDEMPOTENT.#entry(|| #ret {
				#(#rebinds)*
				#block
			})
		}
	})
}

/// Local that stands in for a by-value `self` inside the closure.
const SELF_REBIND: &str = "__recheck_self";

/// Emits a fresh clone for every by-value identifier parameter and strips
/// `mut` from the outer binding, which the clone inherits instead.
///
/// `self` cannot be shadowed, so a by-value receiver is cloned into
/// [`SELF_REBIND`] and the body is renamed to match (see [`rename_self`]).
fn rebind_owned_params(func: &mut ItemFn) -> Vec<TokenStream2> {
	let mut rebinds = Vec::new();
	for arg in func.sig.inputs.iter_mut() {
		let param = match arg {
			FnArg::Receiver(receiver) => {
				if !matches!(*receiver.ty, Type::Reference(_)) {
					let mutability = receiver.mutability.take();
					let local = Ident::new(SELF_REBIND, receiver.self_token.span);
					rebinds.push(quote! {
						let #mutability #local = ::core::clone::Clone::clone(&self);
					});
				}
				continue;
			}
			FnArg::Typed(param) => param,
		};
		if matches!(*param.ty, Type::Reference(_)) {
			continue;
		}
		let Pat::Ident(pat) = &mut *param.pat else {
			continue;
		};
		if pat.by_ref.is_some() {
			continue;
		}
		let ident = &pat.ident;
		let mutability = pat.mutability.take();
		rebinds.push(quote! {
			let #mutability #ident = ::core::clone::Clone::clone(&#ident);
		});
	}
	rebinds
}

fn owns_receiver(func: &ItemFn) -> bool {
	func.sig.receiver().is_some_and(|receiver| !matches!(*receiver.ty, Type::Reference(_)))
}

/// Rewrites every `self` value in `tokens` to [`SELF_REBIND`], descending into
/// groups so macro arguments are covered. `self::` module paths are kept.
fn rename_self(tokens: TokenStream2) -> TokenStream2 {
	let mut out = Vec::new();
	let mut iter = tokens.into_iter().peekable();
	while let Some(tree) = iter.next() {
		match tree {
			TokenTree::Ident(ident) if ident == "self" => {
				let is_path = matches!(iter.peek(), Some(TokenTree::Punct(p)) if p.as_char() == ':');
				if is_path {
					out.push(TokenTree::Ident(ident));
				} else {
					out.push(TokenTree::Ident(Ident::new(SELF_REBIND, ident.span())));
				}
			}
			TokenTree::Group(group) => {
				let mut renamed = Group::new(group.delimiter(), rename_self(group.stream()));
				renamed.set_span(group.span());
				out.push(TokenTree::Group(renamed));
			}
			other => out.push(other),
		}
	}
	out.into_iter().collect()
}

/// Closure return annotation, omitted when the type mentions borrows or
/// `impl Trait` so inference can pick the lifetimes.
fn closure_return(output: &ReturnType) -> TokenStream2 {
	match output {
		ReturnType::Default => quote! { -> () },
		ReturnType::Type(_, ty) => {
			let ty_str = quote!(#ty).to_string();
			if ty_str.contains('&') || ty_str.contains('\'') || ty_str.contains("impl ") {
				quote! {}
			} else {
				quote! { -> #ty }
			}
		}
	}
}

#[cfg(test)]
mod tests;
