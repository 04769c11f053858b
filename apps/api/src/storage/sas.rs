use crate::errors::AppError;

/// A storage URL carrying a shared-access-signature query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasUrl {
    base: String,
    query: String,
}

impl SasUrl {
    /// Splits `raw` at the first `?`. `setting` names the source for error messages.
    pub fn parse(raw: &str, setting: &str) -> Result<Self, AppError> {
        let (base, query) = raw.trim().split_once('?').ok_or_else(|| {
            AppError::MalformedInput(format!("{setting} must include a SAS query string"))
        })?;

        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            query: query.to_string(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// `{base}/{name}?{sas}`
    pub fn object_url(&self, name: &str) -> String {
        format!("{}/{}?{}", self.base, name, self.query)
    }

    /// Table endpoint without the query string. Account-level URLs get the table
    /// name appended; URLs already pointing at the table are used as-is.
    pub fn table_url(&self, table_name: &str) -> Result<String, AppError> {
        let table_name = table_name.trim();
        let segment = format!("/{table_name}");
        let paren_segment = format!("{segment}()");

        let mut url = if !table_name.is_empty()
            && (self.base.ends_with(&segment) || self.base.ends_with(&paren_segment))
        {
            self.base.clone()
        } else {
            if table_name.is_empty() {
                return Err(AppError::MalformedInput(
                    "table name is required when the table SAS URL is account-level".to_string(),
                ));
            }
            format!("{}{segment}", self.base)
        };

        if let Some(stripped) = url.strip_suffix("()") {
            url = stripped.to_string();
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_query() {
        let err = SasUrl::parse("https://acct.blob.core.windows.net/resumes", "AZURE_CONTAINER_SAS_URL")
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedInput(ref m) if m.contains("AZURE_CONTAINER_SAS_URL")));
    }

    #[test]
    fn test_object_url() {
        let sas = SasUrl::parse(
            " https://acct.blob.core.windows.net/resumes/?sv=2022&sig=abc ",
            "AZURE_CONTAINER_SAS_URL",
        )
        .unwrap();
        assert_eq!(
            sas.object_url("jane-doe-1a2b3c4d.pdf"),
            "https://acct.blob.core.windows.net/resumes/jane-doe-1a2b3c4d.pdf?sv=2022&sig=abc"
        );
        assert_eq!(sas.query(), "sv=2022&sig=abc");
    }

    #[test]
    fn test_table_url_account_level() {
        let sas = SasUrl::parse("https://acct.table.core.windows.net/?sv=1", "T").unwrap();
        assert_eq!(
            sas.table_url("resumes").unwrap(),
            "https://acct.table.core.windows.net/resumes"
        );
        assert!(sas.table_url("").is_err());
    }

    #[test]
    fn test_table_url_already_scoped() {
        let sas = SasUrl::parse("https://acct.table.core.windows.net/resumes()?sv=1", "T").unwrap();
        assert_eq!(
            sas.table_url("resumes").unwrap(),
            "https://acct.table.core.windows.net/resumes"
        );

        let sas = SasUrl::parse("https://acct.table.core.windows.net/resumes/?sv=1", "T").unwrap();
        assert_eq!(
            sas.table_url("resumes").unwrap(),
            "https://acct.table.core.windows.net/resumes"
        );
    }
}
