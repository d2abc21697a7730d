//! 资源映射表
//!
//! 在遍历归档部件阶段由写入器和字体解析器填充，之后只读地交给标记重写器使用。
//! 映射表维护三份数据：
//!
//! - 引用键 → 输出路径（Content-Location、`cid:X`、裸 `X`）
//! - 裸内容标识符 → 输出路径（解析 `cid:` 引用时优先查询）
//! - 所有已生成的输出路径（用于识别已经重写过的引用）

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::utils::url::{is_external_reference, strip_cid_prefix, CID_PREFIX};

/// 一次引用解析的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// 引用命中映射表，应替换为该输出路径
    Mapped(&'a str),
    /// 引用本身就是一个已生成的输出路径
    AlreadyLocal,
    /// 外部引用（http/https/data/根相对等），保持原样
    External,
    /// 未能解析
    Unresolved,
}

#[derive(Debug, Default, Clone)]
pub struct ResourceMap {
    paths: HashMap<String, String>,
    content_ids: HashMap<String, String>,
    outputs: HashSet<String>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为一个已写入（或已预留）的资源登记所有可用的引用键
    ///
    /// 空的 Content-Location 与空的内容标识符会被忽略。同一个键重复登记时后写入者生效。
    pub fn register(&mut self, location: Option<&str>, content_id: Option<&str>, output_path: &str) {
        self.outputs.insert(output_path.to_string());

        if let Some(location) = location.filter(|l| !l.is_empty()) {
            self.insert_path(location, output_path);
            debug!("Mapped path: {} -> {}", location, output_path);
        }

        if let Some(content_id) = content_id.filter(|c| !c.is_empty()) {
            let cid_url = format!("{CID_PREFIX}{content_id}");
            self.insert_path(&cid_url, output_path);
            self.insert_path(content_id, output_path);
            self.content_ids
                .insert(content_id.to_string(), output_path.to_string());
            debug!("Mapped CID: {} -> {}", cid_url, output_path);
        }
    }

    /// 登记单个引用键（字体解析器使用完整 URL 作为键）
    pub fn register_key(&mut self, key: &str, output_path: &str) {
        self.outputs.insert(output_path.to_string());
        self.insert_path(key, output_path);
        debug!("Mapped path: {} -> {}", key, output_path);
    }

    fn insert_path(&mut self, key: &str, output_path: &str) {
        if let Some(previous) = self.paths.insert(key.to_string(), output_path.to_string()) {
            if previous != output_path {
                debug!(
                    "Reference key {} remapped from {} to {}",
                    key, previous, output_path
                );
            }
        }
    }

    /// 按字面键查询
    pub fn get(&self, key: &str) -> Option<&str> {
        self.paths.get(key).map(String::as_str)
    }

    /// 按裸内容标识符查询
    pub fn get_content_id(&self, content_id: &str) -> Option<&str> {
        self.content_ids.get(content_id).map(String::as_str)
    }

    /// 判断给定字符串是否为某个已生成资源的输出路径
    pub fn is_output_path(&self, path: &str) -> bool {
        self.outputs.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// 解析一个来自标记或样式表的引用
    ///
    /// `cid:` 引用依次查询：内容标识符映射 → 通用映射中的裸标识符 → 带前缀的原始字符串。
    /// 其他引用按字面键查询，未命中时外部引用返回 [`Resolution::External`]。
    pub fn resolve(&self, reference: &str) -> Resolution<'_> {
        let reference = reference.trim();

        if let Some(content_id) = strip_cid_prefix(reference) {
            return self
                .get_content_id(content_id)
                .or_else(|| self.get(content_id))
                .or_else(|| self.get(reference))
                .map(Resolution::Mapped)
                .unwrap_or(Resolution::Unresolved);
        }

        if let Some(path) = self.get(reference) {
            Resolution::Mapped(path)
        } else if self.is_output_path(reference) {
            Resolution::AlreadyLocal
        } else if is_external_reference(reference) {
            Resolution::External
        } else {
            Resolution::Unresolved
        }
    }
}
