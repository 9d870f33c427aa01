use tracing::info;

use crate::error::ExecutorError;
use crate::gesture::ActionCommand;
use crate::player::PlayerExecutor;

/// 模拟执行器，只记录日志并返回成功
#[derive(Debug, Clone, Default)]
pub struct SimulatedExecutor {
    sent: usize,
}

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已"发送"的命令数
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl PlayerExecutor for SimulatedExecutor {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError> {
        self.sent += 1;
        info!("[模拟] 将发送: {:?}", command);
        Ok(())
    }
}
