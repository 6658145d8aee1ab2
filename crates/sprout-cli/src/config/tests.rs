#[cfg(test)]
mod tests {
    use crate::cli::{BuildArgs, ProjectArgs};
    use crate::config::{Overrides, load};
    use crate::error::ConfigError;
    use serial_test::serial;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn project(dir: &Path) -> ProjectArgs {
        ProjectArgs {
            cwd: Some(dir.to_path_buf()),
            ..Default::default()
        }
    }

    fn build_args(dir: &Path) -> BuildArgs {
        BuildArgs {
            project: project(dir),
            ..Default::default()
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_any_layer() {
        let temp = TempDir::new().unwrap();
        let args = project(temp.path());

        let config = load(&args, &Overrides::from_project(&args)).unwrap();
        assert_eq!(
            config,
            sprout_build::BuildConfig {
                cwd: Some(temp.path().to_path_buf()),
                ..Default::default()
            }
        );
    }

    #[test]
    #[serial]
    fn test_config_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("sprout.toml"),
            r#"
                bundler = "rollup"
                static = "public"
                ssr = false
                ext = [".svelte", ".svx"]
            "#,
        )
        .unwrap();

        let args = project(temp.path());
        let config = load(&args, &Overrides::from_project(&args)).unwrap();
        assert_eq!(config.bundler.as_deref(), Some("rollup"));
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert!(!config.ssr);
        assert_eq!(config.ext, vec![".svelte", ".svx"]);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_and_flags_override_env() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("sprout.toml"), r#"dest = "from-file""#).unwrap();
        unsafe {
            std::env::set_var("SPROUT_DEST", "from-env");
            std::env::set_var("SPROUT_BASEPATH", "/env");
        }

        let args = BuildArgs {
            dest: Some(PathBuf::from("from-flag")),
            ..build_args(temp.path())
        };
        let with_flag = load(&args.project, &Overrides::from_build(&args));
        let without_flag = load(&args.project, &Overrides::from_project(&args.project));

        unsafe {
            std::env::remove_var("SPROUT_DEST");
            std::env::remove_var("SPROUT_BASEPATH");
        }

        let with_flag = with_flag.unwrap();
        assert_eq!(with_flag.dest, PathBuf::from("from-flag"));
        assert_eq!(with_flag.basepath, "/env");
        assert_eq!(without_flag.unwrap().dest, PathBuf::from("from-env"));
    }

    #[test]
    #[serial]
    fn test_bundler_process_env_ignored() {
        let temp = TempDir::new().unwrap();
        unsafe {
            std::env::set_var("SPROUT_TARGET", "client");
            std::env::set_var("SPROUT_LEGACY_BUILD", "true");
        }

        let args = project(temp.path());
        let config = load(&args, &Overrides::from_project(&args));

        unsafe {
            std::env::remove_var("SPROUT_TARGET");
            std::env::remove_var("SPROUT_LEGACY_BUILD");
        }
        assert!(!config.unwrap().legacy);
    }

    #[test]
    #[serial]
    fn test_unset_switches_do_not_mask_file() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("sprout.toml"),
            "legacy = true\nhashbang = true",
        )
        .unwrap();

        let args = build_args(temp.path());
        let config = load(&args.project, &Overrides::from_build(&args)).unwrap();
        assert!(config.legacy);
        assert!(config.hashbang);
        assert!(config.ssr);
    }

    #[test]
    #[serial]
    fn test_no_ssr_flag_disables_ssr() {
        let temp = TempDir::new().unwrap();
        let args = BuildArgs {
            no_ssr: true,
            ..build_args(temp.path())
        };

        let config = load(&args.project, &Overrides::from_build(&args)).unwrap();
        assert!(!config.ssr);
    }

    #[test]
    #[serial]
    fn test_ext_flag_accepts_string() {
        let temp = TempDir::new().unwrap();
        let args = ProjectArgs {
            ext: Some(".svelte,.svx".to_string()),
            ..project(temp.path())
        };

        let config = load(&args, &Overrides::from_project(&args)).unwrap();
        assert_eq!(config.ext, vec![".svelte", ".svx"]);
    }

    #[test]
    #[serial]
    fn test_explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let args = ProjectArgs {
            config: Some(temp.path().join("missing.toml")),
            ..project(temp.path())
        };

        let err = load(&args, &Overrides::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    #[serial]
    fn test_explicit_config_used_instead_of_default() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("sprout.toml"), r#"bundler = "rollup""#).unwrap();
        fs::write(temp.path().join("custom.toml"), r#"bundler = "webpack""#).unwrap();

        let args = ProjectArgs {
            config: Some(temp.path().join("custom.toml")),
            ..project(temp.path())
        };
        let config = load(&args, &Overrides::from_project(&args)).unwrap();
        assert_eq!(config.bundler.as_deref(), Some("webpack"));
    }

    #[test]
    #[serial]
    fn test_unknown_key_rejected() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("sprout.toml"), r#"entry = "src/main.js""#).unwrap();

        let args = project(temp.path());
        let err = load(&args, &Overrides::from_project(&args)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
