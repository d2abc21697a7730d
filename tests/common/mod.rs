// 集成测试公共模块
//
// 提供构造 MHTML 归档的辅助工具

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

const BOUNDARY: &str = "----MultipartBoundary--test----";

/// MHTML 归档构建器
///
/// 正文按原样写入（`8bit`），二进制内容需要调用方预先编码为 base64。
pub struct ArchiveBuilder {
    parts: Vec<Vec<u8>>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    pub fn part(
        self,
        content_type: &str,
        location: Option<&str>,
        content_id: Option<&str>,
        body: &str,
    ) -> Self {
        self.raw(content_type, location, content_id, body.as_bytes())
    }

    /// 按原样写入任意字节，例如非 UTF-8 编码的网页
    pub fn raw(
        mut self,
        content_type: &str,
        location: Option<&str>,
        content_id: Option<&str>,
        body: &[u8],
    ) -> Self {
        self.parts
            .push(render_part(content_type, location, content_id, "8bit", body));
        self
    }

    pub fn html(self, location: Option<&str>, content_id: Option<&str>, body: &str) -> Self {
        self.part("text/html", location, content_id, body)
    }

    pub fn base64(
        mut self,
        content_type: &str,
        location: Option<&str>,
        content_id: Option<&str>,
        encoded: &str,
    ) -> Self {
        self.parts.push(render_part(
            content_type,
            location,
            content_id,
            "base64",
            encoded.as_bytes(),
        ));
        self
    }

    pub fn build(&self) -> String {
        String::from_utf8(self.build_bytes()).unwrap()
    }

    pub fn build_bytes(&self) -> Vec<u8> {
        let mut archive = Vec::new();
        archive.extend_from_slice(b"From: <Saved by Blink>\r\n");
        archive.extend_from_slice(b"Subject: Test page\r\n");
        archive.extend_from_slice(b"MIME-Version: 1.0\r\n");
        archive.extend_from_slice(b"Content-Type: multipart/related;\r\n");
        archive.extend_from_slice(b"\ttype=\"text/html\";\r\n");
        archive.extend_from_slice(format!("\tboundary=\"{}\"\r\n\r\n", BOUNDARY).as_bytes());

        for part in &self.parts {
            archive.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            archive.extend_from_slice(part);
        }
        archive.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

        archive
    }

    /// 写入 `dir/name` 并返回归档路径
    pub fn write_to(&self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, self.build_bytes()).unwrap();
        path
    }
}

fn render_part(
    content_type: &str,
    location: Option<&str>,
    content_id: Option<&str>,
    transfer_encoding: &str,
    body: &[u8],
) -> Vec<u8> {
    let mut headers = format!("Content-Type: {}\r\n", content_type);
    if let Some(content_id) = content_id {
        headers.push_str(&format!("Content-ID: <{}>\r\n", content_id));
    }
    headers.push_str(&format!("Content-Transfer-Encoding: {}\r\n", transfer_encoding));
    if let Some(location) = location {
        headers.push_str(&format!("Content-Location: {}\r\n", location));
    }
    headers.push_str("\r\n");

    let mut part = headers.into_bytes();
    part.extend_from_slice(body);
    part.extend_from_slice(b"\r\n");
    part
}

/// 8 字节 PNG 文件头
pub const PNG_BASE64: &str = "iVBORw0KGgo=";

/// 只含一张图片的典型归档
pub fn logo_archive() -> ArchiveBuilder {
    ArchiveBuilder::new()
        .html(
            Some("http://example.com/"),
            Some("frame-main@mhtml.blink"),
            "<html><head><title>Logo</title></head><body><img src=\"cid:logo\"></body></html>",
        )
        .base64(
            "image/png",
            Some("http://example.com/logo.png"),
            Some("logo"),
            PNG_BASE64,
        )
}

pub fn read_to_string(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// 只应答一次请求的本地 HTTP 服务，返回 `http://127.0.0.1:端口`
///
/// 应答之后监听端口随线程一起关闭，再次请求会被拒绝。
pub fn serve_once(content_type: &'static str, body: &'static [u8]) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut line = String::new();
        while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
            line.clear();
        }

        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            content_type,
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(body).unwrap();
    });

    (address, handle)
}
