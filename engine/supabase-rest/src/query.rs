//! PostgREST read queries

/// A paginated `select` against one table
///
/// ```
/// use supabase_rest::Select;
///
/// let query = Select::table("players")
///     .columns(&["player_id", "sleeper_id"])
///     .not_null("sleeper_id");
/// assert_eq!(
///     query.to_query_string(0, 1000),
///     "players?select=player_id,sleeper_id&sleeper_id=not.is.null&offset=0&limit=1000"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: String,
    columns: String,
    filters: Vec<(String, String)>,
    order: Option<String>,
}

impl Select {
    pub fn table(table: &str) -> Self {
        Self { table: table.to_string(), columns: "*".to_string(), filters: Vec::new(), order: None }
    }

    /// Columns to return; embedded resources like `players(first_name)` are allowed
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.join(",");
        self
    }

    /// `column=eq.value`
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push((column.to_string(), format!("eq.{}", value.to_string())));
        self
    }

    /// `column=not.is.null`
    pub fn not_null(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), "not.is.null".to_string()));
        self
    }

    /// `column=is.null`
    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push((column.to_string(), "is.null".to_string()));
        self
    }

    /// Order expression such as `value.desc`
    pub fn order(mut self, order: &str) -> Self {
        self.order = Some(order.to_string());
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn order_by(&self) -> Option<&str> {
        self.order.as_deref()
    }

    /// Column names selected at the top level (`*` means all)
    pub fn selected_columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut depth = 0usize;
        let mut current = String::new();
        for c in self.columns.chars() {
            match c {
                '(' => {
                    depth += 1;
                    current.push(c);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    current.push(c);
                }
                ',' if depth == 0 => out.push(std::mem::take(&mut current)),
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            out.push(current);
        }
        out.into_iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect()
    }

    /// Query pairs for one page
    pub fn query_pairs(&self, offset: usize, limit: usize) -> Vec<(String, String)> {
        let mut pairs = vec![("select".to_string(), self.columns.clone())];
        pairs.extend(self.filters.iter().cloned());
        if let Some(order) = &self.order {
            pairs.push(("order".to_string(), order.clone()));
        }
        pairs.push(("offset".to_string(), offset.to_string()));
        pairs.push(("limit".to_string(), limit.to_string()));
        pairs
    }

    /// Unencoded `table?select=...` form, used in logs
    pub fn to_query_string(&self, offset: usize, limit: usize) -> String {
        let query = self
            .query_pairs(offset, limit)
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.table, query)
    }
}
