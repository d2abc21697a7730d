//! CSS 资源引用扫描与重写
//!
//! 使用 cssparser 的词法分析器定位样式表中的每一个资源引用：
//!
//! - `url(x)`：未加引号的 URL
//! - `url("x")` / `url('x')`：带引号的 URL（任意嵌套深度，包括 `@font-face` 与 `image-set()`）
//! - `@import "x.css"`：导入语句中的字符串
//!
//! 每个引用都带有原始文本中的字节范围（不含引号），替换按范围从后往前进行，
//! 因此同一个 URL 在文本中出现多次时互不影响，周围的文本与引号风格也保持不变。
//!
//! ```rust
//! use mhtml_unpack::parsers::css::rewrite_css_urls;
//!
//! let (css, count) = rewrite_css_urls("background:url('cid:img1')", |url| {
//!     (url.value == "cid:img1").then(|| "resource/image/a1b2c3d4.png".to_string())
//! });
//! assert_eq!(css, "background:url('resource/image/a1b2c3d4.png')");
//! assert_eq!(count, 1);
//! ```

use std::ops::Range;

use cssparser::{ParseError, Parser, ParserInput, Token};

use crate::resources::sanitize::has_extension;
use crate::utils::url::{is_external_reference, join_relative, strip_cid_prefix, url_path_without_query};

/// 字体文件扩展名
pub const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "eot", "otf"];

/// 样式表中的一个资源引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssUrl {
    /// 反转义后的 URL 文本
    pub value: String,
    /// 原始 URL 文本在样式表中的字节范围（不含引号与空白）
    pub span: Range<usize>,
}

impl CssUrl {
    /// URL 路径是否以字体扩展名结尾
    pub fn is_font(&self) -> bool {
        has_extension(url_path_without_query(&self.value), FONT_EXTENSIONS)
    }
}

/// 找出样式表中的全部资源引用，按出现顺序返回
pub fn find_css_urls(css: &str) -> Vec<CssUrl> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut found = Vec::new();

    // 词法错误只会提前结束扫描，已找到的引用仍然有效
    let _ = scan_block(&mut parser, false, &mut found);

    found
}

fn scan_block<'i>(
    parser: &mut Parser<'i, '_>,
    inside_url_function: bool,
    found: &mut Vec<CssUrl>,
) -> Result<(), ParseError<'i, ()>> {
    let mut after_import = false;

    loop {
        let token_start = parser.position();
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::WhiteSpace(_) | Token::Comment(_) => {}
            Token::AtKeyword(ref name) => {
                after_import = name.eq_ignore_ascii_case("import");
            }
            Token::QuotedString(ref value) => {
                if inside_url_function || after_import {
                    let raw = parser.slice_from(token_start);
                    let start = token_start.byte_index() + 1;
                    // 未闭合的字符串没有结尾引号
                    let end = token_start.byte_index() + raw.len()
                        - usize::from(raw.len() > 1 && raw.ends_with(['"', '\'']));
                    found.push(CssUrl {
                        value: value.to_string(),
                        span: start..end.max(start),
                    });
                }
                after_import = false;
            }
            Token::UnquotedUrl(ref value) => {
                let raw = parser.slice_from(token_start);
                if let Some(open) = raw.find('(') {
                    let inner = raw[open + 1..].strip_suffix(')').unwrap_or(&raw[open + 1..]);
                    let leading = inner.len() - inner.trim_start().len();
                    let start = token_start.byte_index() + open + 1 + leading;
                    found.push(CssUrl {
                        value: value.to_string(),
                        span: start..start + inner.trim().len(),
                    });
                }
                after_import = false;
            }
            Token::Function(ref name) => {
                let is_url = name.eq_ignore_ascii_case("url");
                let _ = parser.parse_nested_block(|nested| scan_block(nested, is_url, &mut *found));
                after_import = false;
            }
            Token::ParenthesisBlock | Token::SquareBracketBlock | Token::CurlyBracketBlock => {
                let _ = parser.parse_nested_block(|nested| scan_block(nested, false, &mut *found));
                after_import = false;
            }
            _ => {
                after_import = false;
            }
        }
    }

    Ok(())
}

/// 重写样式表中的资源引用
///
/// `resolve` 按出现顺序对每个引用调用一次，返回 `Some(new)` 表示替换。
/// 返回重写后的文本和替换次数。
pub fn rewrite_css_urls<F>(css: &str, mut resolve: F) -> (String, usize)
where
    F: FnMut(&CssUrl) -> Option<String>,
{
    let replacements: Vec<(Range<usize>, String)> = find_css_urls(css)
        .into_iter()
        .filter_map(|css_url| resolve(&css_url).map(|new| (css_url.span, new)))
        .collect();

    let mut result = css.to_string();
    for (span, new) in replacements.iter().rev() {
        result.replace_range(span.clone(), new);
    }

    (result, replacements.len())
}

/// 把保存在 `from_dir` 下的样式表中的相对引用改写为相对输出根目录的路径
///
/// 用于把样式表内联进根目录下的 HTML 文档。只有换算结果被 `accept` 接受时才替换，
/// 外部引用和 cid 引用保持不变。
pub fn rebase_css_urls<F>(css: &str, from_dir: &str, accept: F) -> String
where
    F: Fn(&str) -> bool,
{
    let (rebased, _) = rewrite_css_urls(css, |css_url| {
        let value = css_url.value.as_str();
        if strip_cid_prefix(value).is_some() || is_external_reference(value) {
            return None;
        }
        join_relative(from_dir, value).filter(|joined| accept(joined))
    });

    rebased
}
