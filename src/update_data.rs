use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::models::Transition;

const FIELDS_SECTION: &str = "fields";
const UPDATE_SECTION: &str = "update";

/// `update` セクションの操作種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    Add,
    Set,
    Edit,
    Remove,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "add",
            OperationKind::Set => "set",
            OperationKind::Edit => "edit",
            OperationKind::Remove => "remove",
        }
    }
}

/// フィールドごとの操作の出力順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationOrder {
    /// 呼び出し順のまま出力
    #[default]
    CallOrder,
    /// フィールドごとに add → set → edit → remove の順にまとめて出力
    KindMajor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldOperation {
    pub kind: OperationKind,
    pub value: Value,
}

impl FieldOperation {
    fn to_value(&self) -> Value {
        let mut operation = Map::new();
        operation.insert(self.kind.as_str().to_string(), self.value.clone());
        Value::Object(operation)
    }
}

/// Issue更新リクエスト（`PUT issue/{key}`）のビルダー
///
/// 同じフィールドを `fields`（直接設定）と `update`（操作リスト）の両方に含めることはできない。
/// 競合は `render()` 時ではなく、追加しようとした時点でエラーになる。
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateData {
    notify_users: bool,
    transition_id: Option<String>,
    fields: Map<String, Value>,
    updates: Vec<(String, Vec<FieldOperation>)>,
    properties: Vec<(String, Value)>,
    order: OperationOrder,
}

impl Default for UpdateData {
    fn default() -> Self {
        Self {
            notify_users: true,
            transition_id: None,
            fields: Map::new(),
            updates: Vec::new(),
            properties: Vec::new(),
            order: OperationOrder::default(),
        }
    }
}

impl UpdateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_operation_order(mut self, order: OperationOrder) -> Self {
        self.order = order;
        self
    }

    /// `fields` セクションに値を直接設定する
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        let name = name.into();
        if self.operations(&name).is_some() {
            return Err(Error::ConflictingFieldUsage {
                field: name,
                section: UPDATE_SECTION.to_string(),
            });
        }

        self.fields.insert(name, value.into());
        Ok(self)
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.push_operation(OperationKind::Add, name.into(), value.into())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.push_operation(OperationKind::Set, name.into(), value.into())
    }

    pub fn edit(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.push_operation(OperationKind::Edit, name.into(), value.into())
    }

    pub fn remove(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<&mut Self> {
        self.push_operation(OperationKind::Remove, name.into(), value.into())
    }

    fn push_operation(&mut self, kind: OperationKind, name: String, value: Value) -> Result<&mut Self> {
        if self.fields.contains_key(&name) {
            return Err(Error::ConflictingFieldUsage {
                field: name,
                section: FIELDS_SECTION.to_string(),
            });
        }

        let operation = FieldOperation { kind, value };
        match self.updates.iter_mut().find(|(field, _)| *field == name) {
            Some((_, operations)) => operations.push(operation),
            None => self.updates.push((name, vec![operation])),
        }
        Ok(self)
    }

    /// Issueプロパティ（キー・値）を追加
    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.push((key.into(), value.into()));
        self
    }

    /// 更新と同時に実行する遷移を設定
    pub fn set_transition(&mut self, transition: &Transition) -> &mut Self {
        self.set_transition_id(transition.id())
    }

    pub fn set_transition_id(&mut self, transition_id: impl Into<String>) -> &mut Self {
        self.transition_id = Some(transition_id.into());
        self
    }

    pub fn set_notify_users(&mut self, notify: bool) -> &mut Self {
        self.notify_users = notify;
        self
    }

    /// ウォッチャーに通知するかどうか（デフォルト: true）
    pub fn notify_users(&self) -> bool {
        self.notify_users
    }

    pub fn transition_id(&self) -> Option<&str> {
        self.transition_id.as_deref()
    }

    pub fn operations(&self, name: &str) -> Option<&[FieldOperation]> {
        self.updates
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, operations)| operations.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.transition_id.is_none()
            && self.fields.is_empty()
            && self.updates.is_empty()
            && self.properties.is_empty()
    }

    /// リクエストボディを生成（空のセクションは出力しない）
    pub fn render(&self) -> Value {
        let mut data = Map::new();

        if let Some(id) = &self.transition_id {
            data.insert("transition".to_string(), json!({ "id": id }));
        }

        if !self.fields.is_empty() {
            data.insert(FIELDS_SECTION.to_string(), Value::Object(self.fields.clone()));
        }

        if !self.updates.is_empty() {
            let mut update = Map::new();
            for (field, operations) in &self.updates {
                let mut ordered: Vec<&FieldOperation> = operations.iter().collect();
                if self.order == OperationOrder::KindMajor {
                    ordered.sort_by_key(|operation| operation.kind);
                }
                update.insert(
                    field.clone(),
                    Value::Array(ordered.into_iter().map(FieldOperation::to_value).collect()),
                );
            }
            data.insert(UPDATE_SECTION.to_string(), Value::Object(update));
        }

        if !self.properties.is_empty() {
            let properties = self
                .properties
                .iter()
                .map(|(key, value)| json!({ "key": key, "value": value }))
                .collect();
            data.insert("properties".to_string(), Value::Array(properties));
        }

        Value::Object(data)
    }
}

impl Serialize for UpdateData {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.render().serialize(serializer)
    }
}
