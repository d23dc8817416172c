//! `#[derive(ConfigEnum)]` 实现

use crate::utils::{registration_ident, to_screaming_snake_case};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Fields, LitStr, Result, Variant};

/// 常量名称：`#[config_enum(name = "..")]`，缺省为变体名的大写蛇形形式
fn constant_name(variant: &Variant) -> Result<String> {
    let mut name = None;
    for attr in variant.attrs.iter().filter(|attr| attr.path().is_ident("config_enum")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                name = Some(meta.value()?.parse::<LitStr>()?.value());
                Ok(())
            } else {
                Err(meta.error("未知的 config_enum 参数，支持: name"))
            }
        })?;
    }
    Ok(name.unwrap_or_else(|| to_screaming_snake_case(&variant.ident.to_string())))
}

/// 实现 #[derive(ConfigEnum)] 宏
pub fn derive_config_enum_impl(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(&input.generics, "配置枚举不能带泛型参数"));
    }
    let Data::Enum(data) = &input.data else {
        return Err(Error::new_spanned(name, "#[derive(ConfigEnum)] 只能用于枚举"));
    };

    let mut constants = Vec::new();
    let mut arms = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(Error::new_spanned(variant, "配置枚举的变体不能带字段"));
        }
        let ident = &variant.ident;
        let constant = constant_name(variant)?;
        constants.push(quote! { #name::#ident });
        arms.push(quote! { Self::#ident => #constant });
    }

    let body = if arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! { match self { #(#arms),* } }
    };
    let register_fn = registration_ident("config_enum", name);

    Ok(quote! {
        impl infrastructure_common::ConfigEnum for #name {
            fn constants() -> &'static [Self] {
                const CONSTANTS: &[#name] = &[#(#constants),*];
                CONSTANTS
            }

            fn constant_name(&self) -> &'static str {
                #body
            }
        }

        #[ctor::ctor]
        fn #register_fn() {
            infrastructure_common::register_config_enum::<#name>();
        }
    })
}
