use crate::error::ExecutorError;
use crate::gesture::ActionCommand;
use crate::player::PlayerExecutor;
use crate::player::cli::{Mixer, run_tool};

/// 通过 `playerctl` 控制 MPRIS2 播放器
#[derive(Debug, Clone)]
pub struct PlayerctlExecutor {
    player: String,
    mixer: Mixer,
}

impl PlayerctlExecutor {
    /// # 参数
    /// * `player` - `playerctl -p` 使用的播放器名，例如 `mpv`
    /// * `mixer` - 处理音量命令的混音器
    pub fn new(player: impl Into<String>, mixer: Mixer) -> Self {
        Self {
            player: player.into(),
            mixer,
        }
    }

    /// 播放命令对应的 playerctl 参数，音量命令返回 `None`
    pub fn args(&self, command: &ActionCommand) -> Option<Vec<String>> {
        let mut args = vec!["-p".to_string(), self.player.clone()];
        match command {
            ActionCommand::Play => args.push("play".to_string()),
            ActionCommand::Pause => args.push("pause".to_string()),
            ActionCommand::Stop => args.push("stop".to_string()),
            ActionCommand::Seek(seconds) => {
                let sign = if *seconds < 0 { '-' } else { '+' };
                args.push("position".to_string());
                args.push(format!("{}{sign}", seconds.unsigned_abs()));
            }
            ActionCommand::Volume(_) => return None,
        }
        Some(args)
    }
}

impl PlayerExecutor for PlayerctlExecutor {
    fn name(&self) -> &'static str {
        "playerctl"
    }

    async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError> {
        match (command, self.args(command)) {
            (_, Some(args)) => run_tool("playerctl", &args).await,
            (ActionCommand::Volume(percent), None) => self.mixer.change_volume(*percent).await,
            (_, None) => Ok(()),
        }
    }
}
