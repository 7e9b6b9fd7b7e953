use serde::{Deserialize, Deserializer, Serialize};

/// 个人资料
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub institution: String,
}

// 服务端未填写的字段返回 null
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 可编辑的资料字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    FullName,
    Email,
    Phone,
    Institution,
}

impl std::str::FromStr for ProfileField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "fullName" | "full_name" => Ok(ProfileField::FullName),
            "email" => Ok(ProfileField::Email),
            "phone" => Ok(ProfileField::Phone),
            "institution" | "school" => Ok(ProfileField::Institution),
            other => Err(format!("未知的资料字段: {}", other)),
        }
    }
}

impl Profile {
    /// 至少填写了一个字段
    pub fn has_any_field(&self) -> bool {
        [&self.full_name, &self.email, &self.phone, &self.institution]
            .iter()
            .any(|v| !v.is_empty())
    }

    pub fn set(&mut self, field: ProfileField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ProfileField::FullName => self.full_name = value,
            ProfileField::Email => self.email = value,
            ProfileField::Phone => self.phone = value,
            ProfileField::Institution => self.institution = value,
        }
    }
}
