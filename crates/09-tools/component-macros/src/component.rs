//! `#[derive(Component)]` 实现

use crate::utils::{extract_generic_type, find_field_attribute, is_arc_type, is_option_type, registration_ident};
use proc_macro2::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Error, Expr, Field, Fields, Ident, LitStr, Result, Type};

/// 定时方法参数
struct ScheduledArgs {
    method: LitStr,
    initial_delay: Option<Expr>,
    fixed_delay: Expr,
    unit: TokenStream,
}

impl ScheduledArgs {
    /// 解析 `scheduled(method = "..", fixed_delay = N, initial_delay = N, unit = "..")`
    fn parse(meta: &ParseNestedMeta<'_>) -> Result<Self> {
        let mut method = None;
        let mut initial_delay = None;
        let mut fixed_delay = None;
        let mut unit = quote! { infrastructure_common::TimeUnit::Milliseconds };

        meta.parse_nested_meta(|inner| {
            if inner.path.is_ident("method") {
                method = Some(inner.value()?.parse::<LitStr>()?);
            } else if inner.path.is_ident("initial_delay") {
                initial_delay = Some(inner.value()?.parse::<Expr>()?);
            } else if inner.path.is_ident("fixed_delay") {
                fixed_delay = Some(inner.value()?.parse::<Expr>()?);
            } else if inner.path.is_ident("unit") {
                unit = time_unit(&inner.value()?.parse::<LitStr>()?)?;
            } else {
                return Err(inner.error("未知的 scheduled 参数，支持: method, initial_delay, fixed_delay, unit"));
            }
            Ok(())
        })?;

        Ok(Self {
            method: method.ok_or_else(|| meta.error("scheduled 缺少 method"))?,
            initial_delay,
            fixed_delay: fixed_delay.ok_or_else(|| meta.error("scheduled 缺少 fixed_delay"))?,
            unit,
        })
    }
}

fn time_unit(lit: &LitStr) -> Result<TokenStream> {
    let variant = match lit.value().to_ascii_lowercase().as_str() {
        "nanoseconds" => quote! { Nanoseconds },
        "microseconds" => quote! { Microseconds },
        "milliseconds" => quote! { Milliseconds },
        "seconds" => quote! { Seconds },
        "minutes" => quote! { Minutes },
        "hours" => quote! { Hours },
        "days" => quote! { Days },
        other => return Err(Error::new(lit.span(), format!("未知的时间单位: {other}"))),
    };
    Ok(quote! { infrastructure_common::TimeUnit::#variant })
}

/// 组件参数
#[derive(Default)]
struct ComponentArgs {
    lazy: bool,
    post_construct: Vec<LitStr>,
    pre_destroy: Vec<LitStr>,
    scheduled: Vec<ScheduledArgs>,
}

impl ComponentArgs {
    fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut args = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("lazy") {
                    args.lazy = true;
                } else if meta.path.is_ident("post_construct") {
                    args.post_construct.push(meta.value()?.parse()?);
                } else if meta.path.is_ident("pre_destroy") {
                    args.pre_destroy.push(meta.value()?.parse()?);
                } else if meta.path.is_ident("scheduled") {
                    args.scheduled.push(ScheduledArgs::parse(&meta)?);
                } else {
                    return Err(meta.error("未知的 component 参数，支持: lazy, post_construct, pre_destroy, scheduled"));
                }
                Ok(())
            })?;
        }
        Ok(args)
    }
}

/// 字段的注入方式
enum FieldInjection {
    /// `#[inject]`，类型为 `Arc<U>`
    Component(Type),
    /// `#[value("key")]`，类型为 `V` 或 `Option<V>`
    Value { key: LitStr, ty: Type, optional: bool },
    /// 未标注的字段使用 `Default`
    Default,
}

impl FieldInjection {
    fn from_field(field: &Field) -> Result<Self> {
        let inject = find_field_attribute(field, "inject");
        let value = find_field_attribute(field, "value");

        match (inject, value) {
            (Some(attr), Some(_)) => Err(Error::new_spanned(attr, "字段不能同时标注 #[inject] 和 #[value]")),
            (Some(attr), None) => {
                let inner = extract_generic_type(&field.ty)
                    .filter(|_| is_arc_type(&field.ty))
                    .ok_or_else(|| Error::new_spanned(attr, "#[inject] 字段的类型必须是 Arc<T>"))?;
                Ok(Self::Component(inner.clone()))
            }
            (None, Some(attr)) => {
                let key: LitStr = attr.parse_args()?;
                if is_option_type(&field.ty) {
                    let inner = extract_generic_type(&field.ty)
                        .ok_or_else(|| Error::new_spanned(&field.ty, "无法识别 Option 的类型参数"))?;
                    Ok(Self::Value {
                        key,
                        ty: inner.clone(),
                        optional: true,
                    })
                } else {
                    Ok(Self::Value {
                        key,
                        ty: field.ty.clone(),
                        optional: false,
                    })
                }
            }
            (None, None) => Ok(Self::Default),
        }
    }

    fn requirement(&self) -> Option<TokenStream> {
        match self {
            Self::Component(ty) => Some(quote! { infrastructure_common::Requirement::component::<#ty>() }),
            Self::Value { key, ty, .. } => Some(quote! { infrastructure_common::Requirement::value::<#ty>(#key) }),
            Self::Default => None,
        }
    }

    fn initializer(&self) -> TokenStream {
        match self {
            Self::Component(ty) => quote! { arguments.component::<#ty>()? },
            Self::Value { ty, optional: true, .. } => quote! { arguments.value::<#ty>()? },
            Self::Value { ty, optional: false, .. } => quote! { arguments.required_value::<#ty>()? },
            Self::Default => quote! { ::core::default::Default::default() },
        }
    }
}

/// 生成构造函数
///
/// 标注的字段成为注入构造函数的需求，按字段声明顺序排列。
fn constructor(name: &Ident, fields: &Fields) -> Result<TokenStream> {
    let named = match fields {
        Fields::Unit => {
            return Ok(quote! {
                .constructor(|| ::core::result::Result::Ok(#name))
            });
        }
        Fields::Named(named) => &named.named,
        Fields::Unnamed(unnamed) => {
            return Err(Error::new_spanned(unnamed, "#[derive(Component)] 只支持具名字段或单元结构体"));
        }
    };

    let mut requirements = Vec::new();
    let mut initializers = Vec::new();
    for field in named {
        let injection = FieldInjection::from_field(field)?;
        let ident = &field.ident;
        let init = injection.initializer();
        requirements.extend(injection.requirement());
        initializers.push(quote! { #ident: #init });
    }

    if requirements.is_empty() {
        Ok(quote! {
            .constructor(|| ::core::result::Result::Ok(#name { #(#initializers),* }))
        })
    } else {
        Ok(quote! {
            .injectable_constructor(
                ::std::vec![#(#requirements),*],
                |arguments| ::core::result::Result::Ok(#name { #(#initializers),* }),
            )
        })
    }
}

fn method_ident(lit: &LitStr) -> Result<Ident> {
    lit.parse::<Ident>()
        .map_err(|_| Error::new(lit.span(), format!("无效的方法名: {}", lit.value())))
}

/// 实现 #[derive(Component)] 宏
pub fn derive_component_impl(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(Error::new_spanned(&input.generics, "组件不能带泛型参数"));
    }
    let Data::Struct(data) = &input.data else {
        return Err(Error::new_spanned(name, "#[derive(Component)] 只能用于结构体"));
    };

    let args = ComponentArgs::from_attrs(&input.attrs)?;
    let constructor = constructor(name, &data.fields)?;

    let lazy = args.lazy.then(|| quote! { .lazy() });

    let post_construct = args
        .post_construct
        .iter()
        .map(|lit| {
            let method = method_ident(lit)?;
            Ok(quote! {
                .post_construct(#lit, ::std::vec::Vec::new(), |component, _| {
                    component.#method().map_err(::core::convert::Into::into)
                })
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let pre_destroy = args
        .pre_destroy
        .iter()
        .map(|lit| {
            let method = method_ident(lit)?;
            Ok(quote! {
                .pre_destroy(#lit, ::std::vec::Vec::new(), |component, _| {
                    component.#method().map_err(::core::convert::Into::into)
                })
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let scheduled = args
        .scheduled
        .iter()
        .map(|scheduled| {
            let lit = &scheduled.method;
            let method = method_ident(lit)?;
            let fixed_delay = &scheduled.fixed_delay;
            let unit = &scheduled.unit;
            let initial_delay = scheduled
                .initial_delay
                .as_ref()
                .map(|delay| quote! { .with_initial_delay(#delay) });
            Ok(quote! {
                .scheduled(
                    #lit,
                    infrastructure_common::Schedule::fixed_delay(#fixed_delay, #unit)#initial_delay,
                    |component| component.#method().map_err(::core::convert::Into::into),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let register_fn = registration_ident("component", name);

    Ok(quote! {
        impl infrastructure_common::Component for #name {
            fn definition() -> infrastructure_common::ComponentDefinition {
                infrastructure_common::ComponentDefinition::builder::<Self>()
                    #lazy
                    #constructor
                    #(#post_construct)*
                    #(#pre_destroy)*
                    #(#scheduled)*
                    .build()
            }
        }

        // 程序启动时登记到全局组件表
        #[ctor::ctor]
        fn #register_fn() {
            infrastructure_common::register_component(
                infrastructure_common::RegisteredComponent::of::<#name>(::core::module_path!()),
            );
        }
    })
}
