//! Init command - create project-local kitbag.toml

use crate::cli::args::InitArgs;
use crate::error::{KitbagError, KitbagResult};
use crate::ui::{self, UiContext};
use std::path::Path;
use tokio::fs;

/// Template for project-local config
const INIT_TEMPLATE: &str = r#"# Kitbag project configuration
# Settings here override your global config (~/.config/kitbag/config.toml)

[deployment]
origin = "https://app.example.com"
# Path of the resource manifest relative to the origin
manifest_path = "resources.json"
# Paths staged eagerly on every sync
core_shell = ["/", "index.html"]

# [cache]
# dir = "/var/cache/kitbag"
# partitions = { content = "content", temp = "temp", manifest = "manifest" }

[fetch]
concurrency = 8
"#;

/// Execute the init command
pub async fn execute(args: InitArgs) -> KitbagResult<()> {
    let ctx = UiContext::detect();

    let target_dir = match args.path {
        Some(ref p) => p.clone(),
        None => {
            std::env::current_dir().map_err(|e| KitbagError::io("getting current directory", e))?
        }
    };

    let config_path = target_dir.join("kitbag.toml");

    if config_path.exists() && !args.force {
        return Err(KitbagError::User(format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        )));
    }

    ensure_dir(&target_dir).await?;

    fs::write(&config_path, INIT_TEMPLATE)
        .await
        .map_err(|e| KitbagError::io(format!("writing {}", config_path.display()), e))?;

    ui::step_ok_detail(
        &ctx,
        "Created project config",
        &config_path.display().to_string(),
    );
    ui::remark(&ctx, "Set deployment.origin, then run: kitbag sync");

    Ok(())
}

async fn ensure_dir(dir: &Path) -> KitbagResult<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| KitbagError::io(format!("creating directory {}", dir.display()), e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_config() {
        let temp = TempDir::new().unwrap();
        let args = InitArgs {
            force: false,
            path: Some(temp.path().to_path_buf()),
        };
        execute(args).await.unwrap();

        let content = std::fs::read_to_string(temp.path().join("kitbag.toml")).unwrap();
        assert!(content.contains("[deployment]"));
        assert!(content.contains("core_shell"));
        assert!(content.contains("[fetch]"));
    }

    #[tokio::test]
    async fn init_refuses_overwrite_without_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("kitbag.toml"), "existing").unwrap();

        let args = InitArgs {
            force: false,
            path: Some(temp.path().to_path_buf()),
        };
        let result = execute(args).await;
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("already exists"));
    }

    #[tokio::test]
    async fn init_overwrites_with_force() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("kitbag.toml"), "old content").unwrap();

        let args = InitArgs {
            force: true,
            path: Some(temp.path().to_path_buf()),
        };
        execute(args).await.unwrap();

        let content = std::fs::read_to_string(temp.path().join("kitbag.toml")).unwrap();
        assert!(content.contains("[deployment]"));
    }

    #[test]
    fn template_parses_as_config() {
        let config: crate::config::Config = toml::from_str(INIT_TEMPLATE).unwrap();
        assert_eq!(config.deployment.origin, "https://app.example.com");
        assert_eq!(config.fetch.concurrency, 8);
    }
}
