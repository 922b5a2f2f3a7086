use anyhow::Result;
use rubric_grader::utils::logging;
use rubric_grader::{App, Config};
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化应用
    let app = App::initialize(config).await?;

    // Ctrl-C 取消，已完成的结果照常输出
    let cancel = app.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ 收到中断信号，正在取消剩余评分...");
            cancel.cancel();
        }
    });

    app.run().await?;

    Ok(())
}
