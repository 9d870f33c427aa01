use crate::error::ExecutorError;
use crate::gesture::ActionCommand;
use crate::player::PlayerExecutor;
use crate::player::cli::{Mixer, run_tool};

const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const MPRIS_PLAYER: &str = "org.mpris.MediaPlayer2.Player";

/// 通过 `dbus-send` 调用 MPRIS2 方法，默认目标是 VLC
#[derive(Debug, Clone)]
pub struct DbusExecutor {
    destination: String,
    mixer: Mixer,
}

impl DbusExecutor {
    pub fn new(destination: impl Into<String>, mixer: Mixer) -> Self {
        Self {
            destination: destination.into(),
            mixer,
        }
    }

    /// 生成 dbus-send 参数，音量命令返回 `None`
    pub fn args(&self, command: &ActionCommand) -> Option<Vec<String>> {
        let (method, extra) = match command {
            ActionCommand::Play => ("Play", None),
            ActionCommand::Pause => ("Pause", None),
            ActionCommand::Stop => ("Stop", None),
            // Seek 的单位是微秒
            ActionCommand::Seek(seconds) => {
                ("Seek", Some(format!("int64:{}", i64::from(*seconds) * 1_000_000)))
            }
            ActionCommand::Volume(_) => return None,
        };

        let mut args = vec![
            "--type=method_call".to_string(),
            format!("--dest={}", self.destination),
            MPRIS_PATH.to_string(),
            format!("{MPRIS_PLAYER}.{method}"),
        ];
        args.extend(extra);
        Some(args)
    }
}

impl PlayerExecutor for DbusExecutor {
    fn name(&self) -> &'static str {
        "dbus"
    }

    async fn execute(&mut self, command: &ActionCommand) -> Result<(), ExecutorError> {
        match (command, self.args(command)) {
            (_, Some(args)) => run_tool("dbus-send", &args).await,
            (ActionCommand::Volume(percent), None) => self.mixer.change_volume(*percent).await,
            (_, None) => Ok(()),
        }
    }
}
