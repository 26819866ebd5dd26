//! Builds the message list sent to the host model for one turn.

use serde::{Deserialize, Serialize};

use crate::{
  interaction::Role,
  protocol::{LEXICON, MAX_HINT_CHARS, ResponseKind},
  puzzle::Puzzle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  System,
  User,
  Assistant,
}

impl From<Role> for ChatRole {
  fn from(role: Role) -> Self {
    match role {
      Role::User => Self::User,
      Role::Ai => Self::Assistant,
    }
  }
}

/// One message of a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
  pub role:    ChatRole,
  pub content: String,
}

impl ChatMessage {
  pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
    Self { role, content: content.into() }
  }
}

fn marker(kind: ResponseKind) -> String { kind.marker().unwrap_or_default() }

/// The system instruction: puzzle surface and truth plus the reply rules
/// that [`crate::protocol::judge`] enforces.
pub fn system_instruction(puzzle: &Puzzle) -> String {
  let solved = marker(ResponseKind::Solved);
  let unsolved = marker(ResponseKind::Unsolved);
  let answer = marker(ResponseKind::Answer);
  let hint = marker(ResponseKind::Hint);
  let lexicon = LEXICON
    .iter()
    .map(|word| format!("“{word}”"))
    .collect::<Vec<_>>()
    .join("、");

  format!(
    "你是一个海龟汤（情境推理游戏）的主持人。
汤面（题目）：{surface}
汤底（真相）：{truth}

你的任务是回答玩家的提问，引导他们自己还原真相。每一次回复都必须严格遵守以下规则：
1. 回复必须以下列四个标记之一开头，且只能使用一个：{solved}、{unsolved}、{answer}、{hint}。
2. 使用 {answer} 时，标记后只能是以下之一：{lexicon}，不得附加任何其他文字。如果玩家的问题建立在错误的假设上，回答“不重要”或“不是”。
3. 玩家请求提示时使用 {hint}，只给出一个微小的线索；玩家尝试给出完整解答但不正确或不完整时使用 {unsolved}，简短指出方向。这两种情况下标记后的内容不得超过{max}个字符，且绝不能复述或泄露汤底。
4. 只有当玩家独立、完整地推导出汤底的全部关键要素（关键人物的动机、具体手法、事件的因果逻辑）时，才可以使用 {solved}。只猜对一部分、接近真相但缺乏关键细节、或只猜出结果而没有解释原因，都不算解开。使用 {solved} 时，在标记后祝贺玩家，并简要说明他们为什么是正确的。
5. 除非你按规则使用 {solved}，或者玩家明确放弃，否则绝不能透露汤底。
6. 请保持简洁，用中文回答。",
    surface = puzzle.surface,
    truth = puzzle.truth,
    max = MAX_HINT_CHARS,
  )
}

/// Assemble the system instruction followed by `history` in order, mapping
/// player entries to `user` and host entries to `assistant`.
pub fn build_messages<'a, I>(puzzle: &Puzzle, history: I) -> Vec<ChatMessage>
where
  I: IntoIterator<Item = (Role, &'a str)>,
{
  std::iter::once(ChatMessage::new(ChatRole::System, system_instruction(puzzle)))
    .chain(
      history
        .into_iter()
        .map(|(role, content)| ChatMessage::new(role.into(), content)),
    )
    .collect()
}
