/// A voice channel a guild member is currently connected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceChannel {
    pub id: u64,
    pub name: String,
}
