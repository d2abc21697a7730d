//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use std::fs;

    use mhtml_unpack::core::{unpack_archive_data, UnpackOptions};

    use crate::common::{read_to_string, serve_once, ArchiveBuilder};

    #[test]
    fn downloaded_font_is_shared_by_stylesheets() {
        let (address, server) = serve_once("font/ttf", b"\x00\x01\x00\x00font");
        let font_url = format!("{address}/fonts/f.ttf");

        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let archive = ArchiveBuilder::new()
            .html(
                Some("http://example.com/"),
                None,
                "<html><head>\
                 <link rel=\"stylesheet\" href=\"cid:first\">\
                 <link rel=\"stylesheet\" href=\"cid:second\">\
                 </head><body></body></html>",
            )
            .part(
                "text/css",
                Some("http://example.com/first.css"),
                Some("first"),
                &format!("@font-face {{ font-family: F; src: url({font_url}); }}"),
            )
            .part(
                "text/css",
                Some("http://example.com/second.css"),
                Some("second"),
                &format!("@font-face {{ font-family: G; src: url(\"{font_url}\"); }}"),
            );
        let options = UnpackOptions {
            download_fonts: true,
            timeout: Some(10),
            ..UnpackOptions::default()
        };

        let summary = unpack_archive_data(archive.build().as_bytes(), &root, &options).unwrap();
        server.join().unwrap();

        assert_eq!(summary.resources_written, 2);
        assert_eq!(
            fs::read(root.join("resource/font/f.ttf")).unwrap(),
            b"\x00\x01\x00\x00font"
        );
        assert_eq!(fs::read_dir(root.join("resource/font")).unwrap().count(), 1);

        // 服务只应答一次，第二个样式表必须复用第一次下载的结果
        let first = read_to_string(&root.join("resource/css/first.css"));
        assert!(first.contains("url(../font/f.ttf)"));
        assert!(!first.contains(&font_url));

        let second = read_to_string(&root.join("resource/css/second.css"));
        assert!(second.contains("../font/f.ttf"));
        assert!(!second.contains(&font_url));

        let main = read_to_string(&root.join("main.html"));
        assert!(main.contains("href=\"resource/css/first.css\""));
        assert!(main.contains("href=\"resource/css/second.css\""));
    }
}
