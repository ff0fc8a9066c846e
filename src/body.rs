//! # Body 解析器
//!
//! 把 body 标识符映射到 (组件类型, 有序参数)，并在生成时调用组件注册表。
//! 同时根据目标状态码计算错误码排除指令。

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::{
    exception::Exception,
    header::HeaderTable,
    param::REFERENCE_ERROR_CODES,
    registry::{ComponentContext, ComponentRegistry},
    util::status_code_of,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyBinding {
    pub component_type: String,
    pub params: Vec<String>,
}

/// `resolve_body` 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBody {
    pub fragment: String,
    /// 错误码排除指令；没有可识别的目标状态码时为空串
    pub error_exclusion: String,
}

#[derive(Debug, Clone, Default)]
pub struct BodyResolver {
    bindings: HashMap<String, BodyBinding>,
}

impl BodyResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 body。组件类型在注册时必须已存在；生成时还会再检查一次，
    /// 因为注册表之后仍可能被修改。
    pub fn register_body(
        &mut self,
        registry: &ComponentRegistry,
        body_id: &str,
        component_type: &str,
        params: Vec<String>,
    ) -> Result<(), Exception> {
        if !registry.contains(component_type) {
            return Err(Exception::UnknownComponentType(component_type.to_string()));
        }
        let binding = BodyBinding {
            component_type: component_type.to_string(),
            params,
        };
        if self.bindings.insert(body_id.to_string(), binding).is_some() {
            warn!("body {}被重新绑定", body_id);
        } else {
            info!("注册body：{} -> {}", body_id, component_type);
        }
        Ok(())
    }

    pub fn binding(&self, body_id: &str) -> Option<&BodyBinding> {
        self.bindings.get(body_id)
    }

    pub fn resolve_body(
        &self,
        registry: &ComponentRegistry,
        headers: &HeaderTable,
        body_id: &str,
        header_id: &str,
    ) -> Result<ResolvedBody, Exception> {
        let binding = self
            .bindings
            .get(body_id)
            .ok_or_else(|| Exception::UnknownBodyId(body_id.to_string()))?;
        let generator = registry.resolve(&binding.component_type)?;

        let header_block = headers.block_for(header_id);
        let ctx = ComponentContext {
            params: &binding.params,
            header_id,
            headers: &header_block,
        };
        let fragment = generator.generate(&ctx);

        let error_exclusion = binding
            .params
            .first()
            .and_then(|p| status_code_of(p))
            .map(error_exclusion)
            .unwrap_or_default();
        debug!(
            "body {} 解析完成，组件类型：{}，响应头：{}",
            body_id, binding.component_type, header_id
        );

        Ok(ResolvedBody {
            fragment,
            error_exclusion,
        })
    }
}

/// 把参考集合中除目标状态码之外的所有状态码重定向到目标错误页。
pub fn error_exclusion(target: u16) -> String {
    let codes = REFERENCE_ERROR_CODES
        .iter()
        .filter(|code| **code != target)
        .map(|code| code.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    format!("error_page {} ={} /{}.html;", codes, target, target)
}
