#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_defaults_leave_everything_unset() {
        let cli = Cli::try_parse_from(["sprout", "build"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };

        assert!(args.project.cwd.is_none());
        assert!(args.dest.is_none());
        assert!(args.bundler.is_none());
        assert!(!args.legacy);
        assert!(!args.no_ssr);
    }

    #[test]
    fn test_build_all_flags() {
        let cli = Cli::try_parse_from([
            "sprout",
            "build",
            "--cwd",
            "app",
            "--config",
            "custom.toml",
            "--routes",
            "pages",
            "--ext",
            ".svelte .svx",
            "--static",
            "public",
            "--dest",
            "out",
            "--bundler",
            "rollup",
            "--legacy",
            "--no-ssr",
            "--hashbang",
            "--basepath",
            "/app",
            "--template-file",
            "index.html",
        ])
        .unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build command");
        };

        assert_eq!(args.project.cwd, Some(PathBuf::from("app")));
        assert_eq!(args.project.config, Some(PathBuf::from("custom.toml")));
        assert_eq!(args.project.routes, Some(PathBuf::from("pages")));
        assert_eq!(args.project.ext.as_deref(), Some(".svelte .svx"));
        assert_eq!(args.static_dir, Some(PathBuf::from("public")));
        assert_eq!(args.dest, Some(PathBuf::from("out")));
        assert_eq!(args.bundler.as_deref(), Some("rollup"));
        assert!(args.legacy && args.no_ssr && args.hashbang);
        assert_eq!(args.basepath.as_deref(), Some("/app"));
        assert_eq!(args.template_file.as_deref(), Some("index.html"));
    }

    #[test]
    fn test_unknown_bundler_rejected() {
        assert!(Cli::try_parse_from(["sprout", "build", "--bundler", "parcel"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["sprout", "-v", "-q", "build"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sprout", "routes", "--json", "--no-color"]).unwrap();
        assert!(cli.no_color);
        let Command::Routes(args) = cli.command else {
            panic!("expected routes command");
        };
        assert!(args.json);
    }
}
