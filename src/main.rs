use anyhow::Result;
use nchu_portal::utils::logging;
use nchu_portal::{App, Config};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置：指定了 NCHU_CONFIG 时读取 TOML 文件，否则读取环境变量
    let config = match std::env::var("NCHU_CONFIG") {
        Ok(path) => Config::from_toml_file(Path::new(&path))?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行一轮
    let _report = App::initialize(config).await?.run().await?;

    Ok(())
}
