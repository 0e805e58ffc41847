use syn::parse::Parser;

use super::*;

fn parse_args(tokens: TokenStream2) -> syn::Result<IdempotentArgs> {
	let mut args = IdempotentArgs::default();
	syn::meta::parser(|meta| args.parse(meta)).parse2(tokens)?;
	Ok(args)
}

fn expanded(args: TokenStream2, func: ItemFn) -> String {
	expand(parse_args(args).unwrap(), func).unwrap().to_string()
}

#[test]
fn equal_return_accepts_bare_and_bool_forms() {
	assert!(parse_args(quote!(equal_return)).unwrap().equal_return);
	assert!(parse_args(quote!(equal_return = true)).unwrap().equal_return);
	assert!(!parse_args(quote!(equal_return = false)).unwrap().equal_return);
}

#[test]
fn enforce_tests_requires_a_bool() {
	assert_eq!(parse_args(quote!(enforce_tests = false)).unwrap().enforce_tests, Some(false));
	assert!(parse_args(quote!(enforce_tests)).is_err());
	assert!(parse_args(quote!(enforce_tests = "no")).is_err());
}

#[test]
fn raises_rejects_empty_kind() {
	let args = parse_args(quote!(raises = "already_applied")).unwrap();
	assert_eq!(args.raises.map(|lit| lit.value()).as_deref(), Some("already_applied"));

	let err = parse_args(quote!(raises = "")).err().unwrap();
	assert!(err.to_string().contains("non-empty"));
}

#[test]
fn crate_accepts_path_or_string() {
	let bare = parse_args(quote!(crate = crate::support::checks)).unwrap().krate.unwrap();
	let quoted = parse_args(quote!(crate = "crate::support::checks")).unwrap().krate.unwrap();
	assert_eq!(quote!(#bare).to_string(), quote!(#quoted).to_string());
}

#[test]
fn unknown_argument_is_rejected() {
	let err = parse_args(quote!(equal_returns)).err().unwrap();
	assert!(err.to_string().starts_with("unknown idempotent attribute"));
}

#[test]
fn async_and_const_functions_are_rejected() {
	let err = expand(IdempotentArgs::default(), parse_quote!(async fn f() {})).err().unwrap();
	assert!(err.to_string().contains("async"));

	let err = expand(IdempotentArgs::default(), parse_quote!(const fn f() {})).err().unwrap();
	assert!(err.to_string().contains("const"));
}

#[test]
fn equal_return_and_raises_conflict() {
	let args = parse_args(quote!(equal_return, raises = "already_applied")).unwrap();
	let err = expand(args, parse_quote!(fn f() -> u8 { 0 })).err().unwrap();
	assert!(err.to_string().contains("cannot be combined"));
}

#[test]
fn entry_point_follows_arguments() {
	let plain = expanded(quote!(), parse_quote!(fn f() {}));
	assert!(plain.contains(". call ("));

	let eq = expanded(quote!(equal_return), parse_quote!(fn f() -> u8 { 0 }));
	assert!(eq.contains(". call_eq ("));
	assert!(eq.contains(". equal_return (true)"));

	let fallible = expanded(quote!(raises = "gone"), parse_quote!(fn f() -> Result<(), E> { Ok(()) }));
	assert!(fallible.contains(". try_call ("));
	assert!(fallible.contains(". raises (\"gone\")"));
}

#[test]
fn enforce_tests_maps_to_function_override() {
	let off = expanded(quote!(enforce_tests = false), parse_quote!(fn f() {}));
	assert!(off.contains("EnforcementMode :: ForceOff"));

	let on = expanded(quote!(enforce_tests = true), parse_quote!(fn f() {}));
	assert!(on.contains("EnforcementMode :: ForceOn"));
}

#[test]
fn default_runtime_path_is_absolute() {
	let out = expanded(quote!(), parse_quote!(fn f() {}));
	assert!(out.contains(":: recheck :: IdempotentFn :: new"));
}

#[test]
fn owned_params_are_cloned_and_lose_outer_mut() {
	let mut func: ItemFn = parse_quote!(fn f(mut name: String, x: &mut Vec<i32>, ref y: u8, (a, b): (u8, u8)) {});
	let rebinds = rebind_owned_params(&mut func);

	assert_eq!(rebinds.len(), 1);
	assert_eq!(
		rebinds[0].to_string(),
		quote!(let mut name = ::core::clone::Clone::clone(&name);).to_string()
	);
	let FnArg::Typed(first) = &func.sig.inputs[0] else {
		panic!("expected a typed parameter");
	};
	let Pat::Ident(pat) = &*first.pat else {
		panic!("expected an identifier pattern");
	};
	assert!(pat.mutability.is_none());
}

#[test]
fn closure_return_skips_borrowed_types() {
	assert!(closure_return(&parse_quote!(-> &str)).is_empty());
	assert!(closure_return(&parse_quote!(-> Cow<'static, str>)).is_empty());
	assert!(closure_return(&parse_quote!(-> impl Iterator<Item = u8>)).is_empty());
	assert_eq!(closure_return(&parse_quote!(-> u32)).to_string(), "-> u32");
	assert_eq!(closure_return(&ReturnType::Default).to_string(), "-> ()");
}

#[test]
fn by_value_receiver_is_cloned_into_a_local() {
	let mut func: ItemFn = parse_quote!(fn into_items(mut self) -> Vec<i32> { self.v });
	assert!(owns_receiver(&func));

	let rebinds = rebind_owned_params(&mut func);
	assert_eq!(
		rebinds[0].to_string(),
		quote!(let mut __recheck_self = ::core::clone::Clone::clone(&self);).to_string()
	);
	let Some(receiver) = func.sig.receiver() else {
		panic!("expected a receiver");
	};
	assert!(receiver.mutability.is_none());
}

#[test]
fn borrowed_receivers_are_left_alone() {
	let mut by_ref: ItemFn = parse_quote!(fn get(&self) -> u8 { self.0 });
	let mut by_mut: ItemFn = parse_quote!(fn set(&mut self) { self.0 = 1; });
	assert!(!owns_receiver(&by_ref));
	assert!(rebind_owned_params(&mut by_ref).is_empty());
	assert!(rebind_owned_params(&mut by_mut).is_empty());
}

#[test]
fn rename_self_reaches_macro_arguments_and_keeps_module_paths() {
	let renamed = rename_self(quote!({ let n = self.len(); format!("{}", self.name); self::helper(n) }));
	assert_eq!(
		renamed.to_string(),
		quote!({ let n = __recheck_self.len(); format!("{}", __recheck_self.name); self::helper(n) }).to_string()
	);
}

#[test]
fn by_value_receiver_body_uses_the_clone() {
	let out = expanded(quote!(), parse_quote!(fn into_items(self) -> Vec<i32> { self.v }));
	assert!(out.contains("let __recheck_self = :: core :: clone :: Clone :: clone (& self) ;"));
	assert!(out.contains("__recheck_self . v"));
}
