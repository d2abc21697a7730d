//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use std::fs;

    use mhtml_unpack::core::{
        unpack_archive, unpack_archive_data, FilenamePolicy, OutputLayout, UnpackOptions,
    };

    use crate::common::{logo_archive, read_to_string, ArchiveBuilder, PNG_BASE64};

    #[test]
    fn rewrites_content_id_reference() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");

        let summary =
            unpack_archive_data(logo_archive().build().as_bytes(), &root, &UnpackOptions::default())
                .unwrap();

        assert_eq!(summary.primary_document, Some(root.join("main.html")));
        assert_eq!(summary.resources_written, 1);
        assert_eq!(summary.total_replacements, 1);
        assert_eq!(summary.unresolved_count(), 0);
        assert_eq!(summary.documents[0].title.as_deref(), Some("Logo"));

        let html = read_to_string(&root.join("main.html"));
        assert!(html.contains("<img src=\"resource/image/logo.png\">"));
        assert!(!html.contains("cid:logo"));

        let image = fs::read(root.join("resource/image/logo.png")).unwrap();
        assert_eq!(image, b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn detects_meta_charset_without_header_charset() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let (page, _, _) = encoding_rs::EUC_KR.encode(
            "<html><head><meta charset=\"euc-kr\"><title>한국어</title></head><body>한국어 문서</body></html>",
        );
        let archive = ArchiveBuilder::new().raw("text/html", Some("http://example.com/"), None, &page);

        let summary =
            unpack_archive_data(&archive.build_bytes(), &root, &UnpackOptions::default()).unwrap();

        assert_eq!(summary.documents[0].title.as_deref(), Some("한국어"));

        let html = read_to_string(&root.join("main.html"));
        assert!(html.contains("<body>한국어 문서</body>"));
        assert!(html.contains("<meta charset=\"utf-8\">"));
        assert!(!html.contains('\u{fffd}'));
    }

    #[test]
    fn creates_all_resource_directories() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");

        unpack_archive_data(logo_archive().build().as_bytes(), &root, &UnpackOptions::default())
            .unwrap();

        for dir in ["image", "css", "javascript", "html", "font"] {
            assert!(root.join("resource").join(dir).is_dir(), "missing {dir}");
        }
    }

    #[test]
    fn rewrites_secondary_document() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let archive = ArchiveBuilder::new()
            .html(
                Some("http://example.com/"),
                None,
                "<html><body><iframe src=\"cid:frame1\"></iframe></body></html>",
            )
            .html(
                Some("http://example.com/frame.html"),
                Some("frame1"),
                "<html><body><img src=\"http://example.com/logo.png\"></body></html>",
            )
            .base64("image/png", Some("http://example.com/logo.png"), Some("logo"), PNG_BASE64);

        let summary =
            unpack_archive_data(archive.build().as_bytes(), &root, &UnpackOptions::default())
                .unwrap();

        let frame_path = root.join("resource/html/frame.html");
        assert_eq!(summary.secondary_documents, vec![frame_path.clone()]);
        assert_eq!(summary.total_replacements, 2);

        let main = read_to_string(&root.join("main.html"));
        assert!(main.contains("src=\"resource/html/frame.html\""));

        let frame = read_to_string(&frame_path);
        assert!(frame.contains("src=\"resource/image/logo.png\""));
    }

    #[test]
    fn leaves_font_references_when_downloads_disabled() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let archive = ArchiveBuilder::new()
            .html(
                Some("http://example.com/"),
                None,
                "<html><head><link rel=\"stylesheet\" href=\"cid:style\"></head><body></body></html>",
            )
            .part(
                "text/css",
                Some("http://example.com/style.css"),
                Some("style"),
                "@font-face { font-family: F; src: url(http://fonts.example.com/f.woff2); }",
            );

        let summary =
            unpack_archive_data(archive.build().as_bytes(), &root, &UnpackOptions::default())
                .unwrap();

        let css = read_to_string(&root.join("resource/css/style.css"));
        assert!(css.contains("url(http://fonts.example.com/f.woff2)"));
        assert_eq!(fs::read_dir(root.join("resource/font")).unwrap().count(), 0);

        let main = read_to_string(&root.join("main.html"));
        assert!(main.contains("href=\"resource/css/style.css\""));
        assert_eq!(summary.total_replacements, 1);
    }

    #[test]
    fn inlines_stylesheets_when_requested() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let archive = ArchiveBuilder::new()
            .html(
                Some("http://example.com/"),
                None,
                "<html><head><link rel=\"stylesheet\" href=\"http://example.com/style.css\"></head><body></body></html>",
            )
            .part(
                "text/css",
                Some("http://example.com/style.css"),
                None,
                "body { color: red; }",
            );
        let options = UnpackOptions {
            inline_stylesheets: true,
            ..UnpackOptions::default()
        };

        unpack_archive_data(archive.build().as_bytes(), &root, &options).unwrap();

        let main = read_to_string(&root.join("main.html"));
        assert!(main.contains("<style>body { color: red; }"));
        assert!(!main.contains("<link"));
        assert!(!root.join("resource/css/style.css").exists());
    }

    #[test]
    fn reports_unresolved_references() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let archive = ArchiveBuilder::new().html(
            Some("http://example.com/"),
            None,
            "<html><body><img src=\"cid:missing\"><a href=\"http://example.org/\">x</a></body></html>",
        );

        let summary =
            unpack_archive_data(archive.build().as_bytes(), &root, &UnpackOptions::default())
                .unwrap();

        assert_eq!(summary.total_replacements, 0);
        assert_eq!(summary.unresolved_count(), 1);
        assert!(summary.documents[0]
            .unresolved
            .iter()
            .any(|reference| reference.contains("cid:missing")));

        let main = read_to_string(&root.join("main.html"));
        assert!(main.contains("src=\"cid:missing\""));
    }

    #[test]
    fn archive_without_html_is_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let archive = ArchiveBuilder::new().base64(
            "image/png",
            Some("http://example.com/logo.png"),
            Some("logo"),
            PNG_BASE64,
        );

        let summary =
            unpack_archive_data(archive.build().as_bytes(), &root, &UnpackOptions::default())
                .unwrap();

        assert_eq!(summary.primary_document, None);
        assert_eq!(summary.resources_written, 1);
        assert!(!root.join("main.html").exists());
        assert!(root.join("resource/image/logo.png").exists());
    }

    #[test]
    fn skips_unsupported_parts() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let archive = logo_archive().part(
            "application/json",
            Some("http://example.com/data.json"),
            None,
            "{\"a\": 1}",
        );

        let summary =
            unpack_archive_data(archive.build().as_bytes(), &root, &UnpackOptions::default())
                .unwrap();

        assert_eq!(summary.resources_written, 1);
        assert_eq!(summary.parts_skipped, 1);
    }

    #[test]
    fn random_names_keep_extension() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("out");
        let options = UnpackOptions {
            filename_policy: FilenamePolicy::AlwaysRandom,
            ..UnpackOptions::default()
        };

        unpack_archive_data(logo_archive().build().as_bytes(), &root, &options).unwrap();

        let names: Vec<String> = fs::read_dir(root.join("resource/image"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".png"));
        assert_ne!(names[0], "logo.png");

        let main = read_to_string(&root.join("main.html"));
        assert!(main.contains(&format!("src=\"resource/image/{}\"", names[0])));
    }

    #[test]
    fn co_located_layout() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = logo_archive().write_to(temp.path(), "saved page.mhtml");
        let options = UnpackOptions {
            output_layout: OutputLayout::CoLocated,
            ..UnpackOptions::default()
        };

        let summary = unpack_archive(&archive_path, &options).unwrap();

        let root = temp.path().join("saved page");
        assert_eq!(summary.output_root, root);
        assert!(root.join("main.html").is_file());
        assert!(root.join("resource/image/logo.png").is_file());
    }

    #[test]
    fn fixed_layout_with_name_template() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = logo_archive().write_to(temp.path(), "page.mht");
        let options = UnpackOptions {
            output_dir: format!("{}/unpacked-%name%", temp.path().display()),
            ..UnpackOptions::default()
        };

        unpack_archive(&archive_path, &options).unwrap();

        assert!(temp.path().join("unpacked-page/main.html").is_file());
    }
}

//  ███████╗ █████╗ ██╗██╗     ██╗███╗   ██╗ ██████╗
//  ██╔════╝██╔══██╗██║██║     ██║████╗  ██║██╔════╝
//  █████╗  ███████║██║██║     ██║██╔██╗ ██║██║  ███╗
//  ██╔══╝  ██╔══██║██║██║     ██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║██║███████╗██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚═╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod failing {
    use mhtml_unpack::core::{unpack_archive, UnpackError, UnpackOptions};

    #[test]
    fn missing_archive() {
        let temp = tempfile::tempdir().unwrap();
        let result = unpack_archive(
            &temp.path().join("absent.mhtml"),
            &UnpackOptions::default(),
        );

        assert!(matches!(result, Err(UnpackError::ArchiveRead { .. })));
    }
}
