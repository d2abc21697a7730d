//! 链接重写模块
//!
//! 在映射表完全建立之后，把 HTML 文档中指向 `cid:` 标识符或原始服务器地址的引用
//! 改写为本地输出路径。处理范围：
//!
//! - 元素属性：`img[src]`、`img[srcset]`、`source[srcset]`、`script[src]`、`link[href]`、
//!   `iframe[src]`、`frame[src]`、`input[type=image][src]`、`video[poster]`
//! - 每个 `style` 属性以及 `<style>` 元素中的 `url(...)`
//!
//! 未能解析的引用保持原样，并以 `<tag attr="value">` 的形式记录下来。

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use html5ever::interface::QualName;
use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{create_element, NodeOrText, TreeSink};
use html5ever::{local_name, namespace_url, ns};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::{debug, warn};

use crate::core::UnpackError;
use crate::parsers::css::{rebase_css_urls, rewrite_css_urls};
use crate::parsers::html::{
    find_elements, get_node_attr, get_node_name, get_title, html_to_dom, parse_link_type,
    parse_srcset, serialize_document, set_charset, set_node_attr, LinkType,
};
use crate::resources::mapping::{Resolution, ResourceMap};
use crate::resources::output::ResourceKind;

/// 携带资源引用的元素属性
const REFERENCE_ATTRIBUTES: &[(&str, &str)] = &[
    ("img", "src"),
    ("script", "src"),
    ("link", "href"),
    ("iframe", "src"),
    ("frame", "src"),
    ("input", "src"),
    ("video", "poster"),
];

/// 携带 srcset 的元素
const SRCSET_ELEMENTS: &[&str] = &["img", "source"];

/// 一次文档重写的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// 重写后的 HTML（UTF-8）
    pub html: String,
    /// 成功替换的引用数量
    pub replacements: usize,
    /// 未解析引用的描述，已排序去重
    pub unresolved: BTreeSet<String>,
    /// 被内联进文档的样式表（相对输出根目录）
    pub inlined_stylesheets: Vec<String>,
    pub title: Option<String>,
}

/// 文档重写过程中累积的计数
#[derive(Debug, Default)]
struct RewriteState {
    replacements: usize,
    unresolved: BTreeSet<String>,
}

impl RewriteState {
    /// 解析单个引用，命中映射时返回新路径
    fn resolve<F>(&mut self, map: &ResourceMap, reference: &str, describe: F) -> Option<String>
    where
        F: FnOnce() -> String,
    {
        let trimmed = reference.trim();
        if trimmed.is_empty() {
            return None;
        }

        match map.resolve(trimmed) {
            Resolution::Mapped(path) => {
                self.replacements += 1;
                debug!("Replaced {} -> {}", trimmed, path);
                Some(path.to_string())
            }
            Resolution::AlreadyLocal | Resolution::External => None,
            Resolution::Unresolved => {
                let description = describe();
                debug!("Unresolved reference: {}", description);
                self.unresolved.insert(description);
                None
            }
        }
    }

    /// 重写一段样式文本中的全部 `url(...)`
    fn rewrite_style(&mut self, map: &ResourceMap, css: &str, owner: &str) -> Option<String> {
        let (rewritten, count) = rewrite_css_urls(css, |url| {
            let value = url.value.as_str();
            self.resolve(map, value, || format!("<{owner}> url({value})"))
        });

        (count > 0).then_some(rewritten)
    }
}

/// HTML 标记重写器
///
/// 只读取映射表，可以安全地对多个文档重复使用。
pub struct MarkupRewriter<'a> {
    map: &'a ResourceMap,
    output_root: &'a Path,
    inline_stylesheets: bool,
}

impl<'a> MarkupRewriter<'a> {
    pub fn new(map: &'a ResourceMap, output_root: &'a Path) -> Self {
        MarkupRewriter {
            map,
            output_root,
            inline_stylesheets: false,
        }
    }

    /// 是否把已保存的外部样式表内联为 `<style>` 元素
    pub fn inline_stylesheets(mut self, enabled: bool) -> Self {
        self.inline_stylesheets = enabled;
        self
    }

    /// 重写一个 HTML 文档
    pub fn rewrite(&self, html: &str) -> Result<RewriteOutcome, UnpackError> {
        let dom = html_to_dom(html);
        let mut state = RewriteState::default();

        let inlined_stylesheets = if self.inline_stylesheets {
            self.inline_linked_stylesheets(&dom, &mut state)
        } else {
            Vec::new()
        };

        self.walk(&dom.document, &mut state);

        set_charset(&dom.document, "utf-8");
        let title = get_title(&dom.document);

        let html = serialize_document(dom).map_err(UnpackError::Serialize)?;

        Ok(RewriteOutcome {
            html,
            replacements: state.replacements,
            unresolved: state.unresolved,
            inlined_stylesheets,
            title,
        })
    }

    /// 把指向已保存样式表的 `<link rel="stylesheet">` 替换为内联 `<style>`
    fn inline_linked_stylesheets(&self, dom: &RcDom, state: &mut RewriteState) -> Vec<String> {
        let stylesheet_dir = ResourceKind::Stylesheet.relative_dir();
        let mut inlined = Vec::new();

        for link_node in find_elements(&dom.document, "link") {
            let rel = get_node_attr(&link_node, "rel").unwrap_or_default();
            if !parse_link_type(&rel).contains(&LinkType::Stylesheet) {
                continue;
            }

            let Some(href) = get_node_attr(&link_node, "href") else {
                continue;
            };
            let Resolution::Mapped(path) = self.map.resolve(&href) else {
                continue;
            };
            if !path.starts_with(&format!("{stylesheet_dir}/")) {
                continue;
            }

            let file_path = path
                .split('/')
                .fold(self.output_root.to_path_buf(), |p, segment| p.join(segment));
            let css = match fs::read_to_string(&file_path) {
                Ok(css) => css,
                Err(err) => {
                    warn!("Cannot inline stylesheet {}: {}", file_path.display(), err);
                    continue;
                }
            };

            let css = rebase_css_urls(&css, &stylesheet_dir, |candidate| {
                self.map.is_output_path(candidate)
            });

            let style_node = create_element(
                dom,
                QualName::new(None, ns!(html), local_name!("style")),
                vec![],
            );
            dom.append(&style_node, NodeOrText::AppendText(StrTendril::from_slice(&css)));
            dom.append_before_sibling(&link_node, NodeOrText::AppendNode(style_node));
            dom.remove_from_parent(&link_node);

            state.replacements += 1;
            debug!("Inlined stylesheet {}", path);
            inlined.push(path.to_string());
        }

        inlined
    }

    fn walk(&self, node: &Handle, state: &mut RewriteState) {
        if let NodeData::Element { .. } = node.data {
            self.rewrite_element(node, state);
        }

        for child_node in node.children.borrow().iter() {
            self.walk(child_node, state);
        }
    }

    fn rewrite_element(&self, node: &Handle, state: &mut RewriteState) {
        let Some(tag) = get_node_name(node) else {
            return;
        };

        for &(element, attr_name) in REFERENCE_ATTRIBUTES {
            if tag != element {
                continue;
            }
            if tag == "input"
                && !get_node_attr(node, "type")
                    .unwrap_or_default()
                    .eq_ignore_ascii_case("image")
            {
                continue;
            }

            if let Some(value) = get_node_attr(node, attr_name) {
                let rewritten = state.resolve(self.map, &value, || {
                    format!("<{tag} {attr_name}=\"{value}\">")
                });
                if let Some(path) = rewritten {
                    set_node_attr(node, attr_name, Some(path));
                }
            }
        }

        if SRCSET_ELEMENTS.contains(&tag) {
            if let Some(srcset) = get_node_attr(node, "srcset") {
                if let Some(rewritten) = self.rewrite_srcset(tag, &srcset, state) {
                    set_node_attr(node, "srcset", Some(rewritten));
                }
            }
        }

        if let Some(style) = get_node_attr(node, "style") {
            let owner = format!("{tag} style");
            if let Some(rewritten) = state.rewrite_style(self.map, &style, &owner) {
                set_node_attr(node, "style", Some(rewritten));
            }
        }

        if tag == "style" {
            for child_node in node.children.borrow().iter() {
                if let NodeData::Text { ref contents } = child_node.data {
                    let css = contents.borrow().to_string();
                    if let Some(rewritten) = state.rewrite_style(self.map, &css, "style") {
                        *contents.borrow_mut() = StrTendril::from_slice(&rewritten);
                    }
                }
            }
        }
    }

    /// 逐个候选项重写 srcset；没有任何候选项命中时返回 `None`
    fn rewrite_srcset(&self, tag: &str, srcset: &str, state: &mut RewriteState) -> Option<String> {
        let mut any_mapped = false;
        let mut candidates: Vec<String> = Vec::new();

        for item in parse_srcset(srcset) {
            let resolved = state.resolve(self.map, item.path, || {
                format!("<{tag} srcset=\"{}\">", item.path)
            });
            let path = match resolved {
                Some(path) => {
                    any_mapped = true;
                    path
                }
                None => item.path.to_string(),
            };

            if item.descriptor.is_empty() {
                candidates.push(path);
            } else {
                candidates.push(format!("{} {}", path, item.descriptor));
            }
        }

        any_mapped.then(|| candidates.join(", "))
    }
}
