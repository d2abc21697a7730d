//! 输出目录布局
//!
//! ```text
//! <output-root>/
//! ├── main.html
//! └── resource/
//!     ├── image/
//!     ├── css/
//!     ├── javascript/
//!     ├── html/
//!     └── font/
//! ```
//!
//! 重写后的标记中所有路径都相对输出根目录，并且始终使用正斜杠。

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{FilenamePolicy, UnpackError};

use super::sanitize::{random_filename, split_extension};

/// 主文档的固定文件名
pub const PRIMARY_DOCUMENT_NAME: &str = "main.html";

/// 资源根目录名
pub const RESOURCE_DIR_NAME: &str = "resource";

/// 资源类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Stylesheet,
    Script,
    Font,
    /// 嵌套（次要）HTML 文档
    Document,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Image,
        ResourceKind::Stylesheet,
        ResourceKind::Script,
        ResourceKind::Font,
        ResourceKind::Document,
    ];

    pub fn subdirectory(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Stylesheet => "css",
            ResourceKind::Script => "javascript",
            ResourceKind::Font => "font",
            ResourceKind::Document => "html",
        }
    }

    /// 该类别目录相对输出根目录的路径，例如 `resource/css`
    pub fn relative_dir(&self) -> String {
        format!("{}/{}", RESOURCE_DIR_NAME, self.subdirectory())
    }
}

/// 一次转换运行共享的输出目录树
///
/// 同时记录本次运行已经占用的文件名，保证同一目录下不会有两个资源写入同一个文件。
#[derive(Debug)]
pub struct OutputTree {
    root: PathBuf,
    claimed: HashSet<(ResourceKind, String)>,
}

impl OutputTree {
    /// 创建输出根目录及全部资源子目录
    pub fn create(root: &Path) -> Result<OutputTree, UnpackError> {
        for kind in ResourceKind::ALL {
            let dir = root.join(RESOURCE_DIR_NAME).join(kind.subdirectory());
            fs::create_dir_all(&dir).map_err(|source| UnpackError::Io { path: dir, source })?;
        }

        Ok(OutputTree {
            root: root.to_path_buf(),
            claimed: HashSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir(&self, kind: ResourceKind) -> PathBuf {
        self.root
            .join(RESOURCE_DIR_NAME)
            .join(kind.subdirectory())
    }

    pub fn primary_document_path(&self) -> PathBuf {
        self.root.join(PRIMARY_DOCUMENT_NAME)
    }

    /// 资源文件相对输出根目录的路径
    pub fn relative_path(kind: ResourceKind, file_name: &str) -> String {
        format!("{}/{}", kind.relative_dir(), file_name)
    }

    /// 将相对输出根目录的正斜杠路径转换为磁盘路径
    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// 为资源占用一个文件名，返回相对输出根目录的路径
    ///
    /// 可读策略下，与本次运行中已占用名称冲突时追加 `_1`、`_2` 等后缀；
    /// 随机策略下只保留扩展名，并避开磁盘上已存在的文件。
    pub fn claim(&mut self, kind: ResourceKind, file_name: &str, policy: FilenamePolicy) -> String {
        let (stem, extension) = split_extension(file_name);
        let dir = self.dir(kind);

        let mut candidate = match policy {
            FilenamePolicy::PreserveReadable => file_name.to_string(),
            FilenamePolicy::AlwaysRandom => random_filename(extension, &dir),
        };

        let mut counter = 1;
        while self.claimed.contains(&(kind, candidate.clone())) {
            candidate = match policy {
                FilenamePolicy::PreserveReadable => format!("{stem}_{counter}{extension}"),
                FilenamePolicy::AlwaysRandom => random_filename(extension, &dir),
            };
            counter += 1;
        }

        self.claimed.insert((kind, candidate.clone()));
        Self::relative_path(kind, &candidate)
    }
}
