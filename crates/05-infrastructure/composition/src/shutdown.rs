//! 进程终止时自动关闭上下文

use crate::context::ApplicationContext;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 等待 Ctrl-C 或 SIGTERM
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("无法监听 Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("无法监听 SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("收到 SIGINT"),
        () = terminate => info!("收到 SIGTERM"),
    }
}

/// 安装关闭钩子
///
/// 收到终止信号后关闭上下文一次。`close` 本身是幂等的，
/// 应用代码提前调用 `close` 不会导致重复销毁。
pub fn install_shutdown_hook(context: Arc<ApplicationContext>) -> JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        context.close().await;
    })
}
