use chrono::NaiveDate;
use std::collections::HashMap;

/// Live values substituted into a reminder template. Always resolved from
/// current store data at dispatch time, never cached.
#[derive(Debug, Clone)]
pub struct TemplateVars {
    pub tenant_name: String,
    pub amount: u64,
    pub due_date: NaiveDate,
    pub property_name: String,
    pub balance: u64,
    pub days_overdue: i64,
    pub receipt_number: Option<String>,
}

impl TemplateVars {
    fn value_for(&self, key: &str) -> Option<String> {
        match key {
            "tenant_name" => Some(self.tenant_name.clone()),
            "amount" => Some(self.amount.to_string()),
            "due_date" => Some(self.due_date.format("%Y-%m-%d").to_string()),
            "property_name" => Some(self.property_name.clone()),
            "balance" => Some(self.balance.to_string()),
            "days_overdue" => Some(self.days_overdue.to_string()),
            "receipt_number" => Some(
                self.receipt_number
                    .clone()
                    .unwrap_or_else(|| "N/A".to_string()),
            ),
            _ => None,
        }
    }
}

/// Named message templates keyed by a stable string.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: HashMap<String, String>,
}

impl TemplateCatalog {
    /// Stock templates shipped with the service. Currency is uniformly KES.
    pub fn standard() -> Self {
        let mut catalog = Self {
            templates: HashMap::new(),
        };
        catalog.register(
            "rent_overdue",
            "Hello {tenant_name}, your rent of KES {amount} for {property_name} was due on \
             {due_date} and is {days_overdue} day(s) overdue. Outstanding balance: KES {balance}. \
             Please pay at your earliest convenience.",
        );
        catalog.register(
            "payment_due",
            "Hello {tenant_name}, a payment of KES {amount} for {property_name} is due on \
             {due_date}. Outstanding balance: KES {balance}.",
        );
        catalog.register(
            "receipt_issued",
            "Hello {tenant_name}, we received KES {amount} for {property_name}. \
             Receipt number: {receipt_number}. Thank you.",
        );
        catalog
    }

    pub fn register(&mut self, key: impl Into<String>, body: impl Into<String>) {
        self.templates.insert(key.into(), body.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    /// Render the template for `key`, substituting known `{placeholder}`
    /// tokens. Unknown placeholders are left verbatim so a typo in a custom
    /// template is visible in the outbound message rather than erased.
    pub fn render(&self, key: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
        let body = self
            .templates
            .get(key)
            .ok_or_else(|| TemplateError::NotFound(key.to_string()))?;
        Ok(substitute(body, vars))
    }
}

fn substitute(body: &str, vars: &TemplateVars) -> String {
    let mut rendered = String::with_capacity(body.len());
    let mut rest = body;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let token = &after_open[..close];
                match vars.value_for(token) {
                    Some(value) => rendered.push_str(&value),
                    None => {
                        rendered.push('{');
                        rendered.push_str(token);
                        rendered.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                rendered.push_str(&rest[open..]);
                return rendered;
            }
        }
    }

    rendered.push_str(rest);
    rendered
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("no template registered for key '{0}'")]
    NotFound(String),
}
