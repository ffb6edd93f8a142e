use super::error::GuestError;

/// 由管理员邮箱的域名前缀拼接访客用户名：`base_域名前缀`
///
/// `a@sub.example.com` + `bob` => `bob_sub`。不做大小写或空白处理，调用方需要自行 trim。
pub fn derive_username(admin_email: &str, base_username: &str) -> Result<String, GuestError> {
    let prefix = domain_prefix(admin_email)
        .ok_or_else(|| GuestError::validation("adminEmail", "管理员邮箱格式无效，无法生成用户名"))?;

    Ok(format!("{}_{}", base_username, prefix))
}

// 域名第一个 `.` 之前的部分
fn domain_prefix(email: &str) -> Option<&str> {
    let (_, domain) = email.split_once('@')?;
    let (prefix, _) = domain.split_once('.')?;
    if prefix.is_empty() {
        return None;
    }
    Some(prefix)
}

/// 邮箱格式校验，等价于 `^[^\s@]+@[^\s@]+\.[^\s@]+$`
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }

    // 域名中至少有一个点，且点的两侧都有字符
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}
