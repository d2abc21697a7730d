//  ██████╗  █████╗ ███████╗███████╗██╗███╗   ██╗ ██████╗
//  ██╔══██╗██╔══██╗██╔════╝██╔════╝██║████╗  ██║██╔════╝
//  ██████╔╝███████║███████╗███████╗██║██╔██╗ ██║██║  ███╗
//  ██╔═══╝ ██╔══██║╚════██║╚════██║██║██║╚██╗██║██║   ██║
//  ██║     ██║  ██║███████║███████║██║██║ ╚████║╚██████╔╝
//  ╚═╝     ╚═╝  ╚═╝╚══════╝╚══════╝╚═╝╚═╝  ╚═══╝ ╚═════╝

#[cfg(test)]
mod passing {
    use assert_cmd::prelude::*;
    use std::process::Command;

    use crate::common::{logo_archive, read_to_string};

    fn cli() -> Command {
        let mut cmd = Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap();
        cmd.env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("MHTML_UNPACK_LOG_LEVEL")
            .env_remove("MHTML_UNPACK_OUTPUT_LAYOUT")
            .env_remove("MHTML_UNPACK_FILENAME_POLICY");
        cmd
    }

    #[test]
    fn print_help_information() {
        let out = cli().arg("-h").output().unwrap();

        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("Usage:"));
        assert!(stdout.contains("--download-fonts"));
        assert!(out.status.success());
    }

    #[test]
    fn print_version() {
        let out = cli().arg("-V").output().unwrap();

        assert_eq!(
            String::from_utf8_lossy(&out.stdout),
            format!("{} {}\n", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
        );
        assert!(out.status.success());
    }

    #[test]
    fn unpack_into_output_directory() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = logo_archive().write_to(temp.path(), "page.mhtml");
        let output_dir = temp.path().join("site");

        let out = cli()
            .arg("-o")
            .arg(&output_dir)
            .arg(&archive_path)
            .output()
            .unwrap();

        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("Primary document:"));
        assert!(stdout.contains("1 resources written"));
        assert!(stdout.contains("1 references rewritten"));
        assert!(out.status.success());

        let html = read_to_string(&output_dir.join("main.html"));
        assert!(html.contains("src=\"resource/image/logo.png\""));
        assert!(output_dir.join("resource/image/logo.png").is_file());
    }

    #[test]
    fn quiet_prints_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let archive_path = logo_archive().write_to(temp.path(), "page.mhtml");

        let out = cli()
            .arg("-q")
            .arg("--layout")
            .arg("co-located")
            .arg(&archive_path)
            .output()
            .unwrap();

        assert!(out.stdout.is_empty());
        assert!(out.status.success());
        assert!(temp.path().join("page/main.html").is_file());
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
    use assert_cmd::prelude::*;
    use std::process::Command;

    #[test]
    fn missing_archive() {
        let temp = tempfile::tempdir().unwrap();
        let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .env("NO_COLOR", "1")
            .arg("-o")
            .arg(temp.path())
            .arg(temp.path().join("absent.mhtml"))
            .output()
            .unwrap();

        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains("Error: cannot read archive"));
        assert_eq!(out.status.code(), Some(1));
    }

    #[test]
    fn unknown_layout() {
        let out = Command::cargo_bin(env!("CARGO_PKG_NAME"))
            .unwrap()
            .arg("--layout")
            .arg("nested")
            .arg("page.mhtml")
            .output()
            .unwrap();

        assert!(!out.status.success());
    }
}
