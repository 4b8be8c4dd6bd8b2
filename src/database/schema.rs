use crate::error::SiteError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content tables exposed through the REST endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Users,
    Categories,
    Projects,
    TeamMembers,
    Testimonials,
    Partners,
    Statistics,
    Features,
    Faqs,
    TechnologyCategories,
    Technologies,
    ProcessSteps,
    BlogCategories,
    BlogPosts,
    PricingPlans,
    News,
    ApiKeys,
    Notifications,
    Analytics,
    Settings,
}

/// Which column marks a row as visible on the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityColumn {
    /// Boolean `is_active`.
    IsActive,
    /// Text `status`, `active` / `inactive`.
    Status,
}

/// Foreign key from a child table to the row it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRef {
    /// Column on the child, e.g. `category_id`.
    pub fk_column: &'static str,
    pub parent: Table,
    /// Parent column that seed files use to name the parent row.
    pub lookup_column: &'static str,
    /// Key seed rows use instead of the id, e.g. `category: Frontend`.
    pub seed_key: &'static str,
}

impl Table {
    /// All tables, parents before children.
    pub const ALL: [Table; 20] = [
        Table::Users,
        Table::Settings,
        Table::Categories,
        Table::Projects,
        Table::TeamMembers,
        Table::Testimonials,
        Table::Partners,
        Table::Statistics,
        Table::Features,
        Table::Faqs,
        Table::TechnologyCategories,
        Table::Technologies,
        Table::ProcessSteps,
        Table::BlogCategories,
        Table::BlogPosts,
        Table::PricingPlans,
        Table::News,
        Table::ApiKeys,
        Table::Notifications,
        Table::Analytics,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Categories => "categories",
            Table::Projects => "projects",
            Table::TeamMembers => "team_members",
            Table::Testimonials => "testimonials",
            Table::Partners => "partners",
            Table::Statistics => "statistics",
            Table::Features => "features",
            Table::Faqs => "faqs",
            Table::TechnologyCategories => "technology_categories",
            Table::Technologies => "technologies",
            Table::ProcessSteps => "process_steps",
            Table::BlogCategories => "blog_categories",
            Table::BlogPosts => "blog_posts",
            Table::PricingPlans => "pricing_plans",
            Table::News => "news",
            Table::ApiKeys => "api_keys",
            Table::Notifications => "notifications",
            Table::Analytics => "analytics",
            Table::Settings => "settings",
        }
    }

    /// Presentation order column, if the table has one.
    pub fn order_column(&self) -> Option<&'static str> {
        match self {
            Table::TeamMembers | Table::Testimonials | Table::Partners | Table::Statistics => {
                Some("display_order")
            }
            Table::Categories
            | Table::Projects
            | Table::Features
            | Table::Faqs
            | Table::TechnologyCategories
            | Table::Technologies
            | Table::ProcessSteps
            | Table::BlogCategories
            | Table::PricingPlans => Some("sort_order"),
            Table::Users
            | Table::BlogPosts
            | Table::News
            | Table::ApiKeys
            | Table::Notifications
            | Table::Analytics
            | Table::Settings => None,
        }
    }

    /// Unique column used as the `on_conflict` target when seeding.
    pub fn conflict_key(&self) -> Option<&'static str> {
        match self {
            Table::Users => Some("email"),
            Table::Categories | Table::Projects | Table::BlogCategories | Table::BlogPosts => {
                Some("slug")
            }
            Table::PricingPlans | Table::News => Some("slug"),
            Table::TeamMembers | Table::Partners => Some("name"),
            Table::TechnologyCategories | Table::Technologies => Some("name"),
            Table::Testimonials => Some("client_name"),
            Table::Statistics => Some("label_en"),
            Table::Features => Some("title_en"),
            Table::Faqs => Some("question_en"),
            Table::ProcessSteps => Some("step_number"),
            Table::ApiKeys => Some("key_hash"),
            Table::Settings => Some("key"),
            Table::Notifications | Table::Analytics => None,
        }
    }

    pub fn activity_column(&self) -> Option<ActivityColumn> {
        match self {
            Table::Projects | Table::BlogPosts | Table::News | Table::Users => {
                Some(ActivityColumn::Status)
            }
            Table::Notifications | Table::Analytics | Table::Settings => None,
            _ => Some(ActivityColumn::IsActive),
        }
    }

    /// Whether the table carries `_en` / `_id` text columns.
    pub fn is_bilingual(&self) -> bool {
        !matches!(
            self,
            Table::Users | Table::ApiKeys | Table::Notifications | Table::Analytics | Table::Settings
        )
    }

    pub fn parent(&self) -> Option<ParentRef> {
        match self {
            Table::Technologies => Some(ParentRef {
                fk_column: "category_id",
                parent: Table::TechnologyCategories,
                lookup_column: "name",
                seed_key: "category",
            }),
            // `projects.category` is a legacy text column, so seeds name the parent by slug
            Table::Projects => Some(ParentRef {
                fk_column: "category_id",
                parent: Table::Categories,
                lookup_column: "slug",
                seed_key: "category_slug",
            }),
            Table::BlogPosts => Some(ParentRef {
                fk_column: "category_id",
                parent: Table::BlogCategories,
                lookup_column: "slug",
                seed_key: "category",
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = SiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Table::ALL
            .iter()
            .copied()
            .find(|table| table.name() == wanted)
            .ok_or_else(|| SiteError::ValidationError(format!("Unknown table: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_tables_unique_and_parseable() {
        let names: HashSet<&str> = Table::ALL.iter().map(Table::name).collect();
        assert_eq!(names.len(), 20);

        for table in Table::ALL {
            assert_eq!(table.name().parse::<Table>().unwrap(), table);
        }
        assert_eq!("Team-Members".parse::<Table>().unwrap(), Table::TeamMembers);
        assert!("widgets".parse::<Table>().is_err());
    }

    #[test]
    fn test_parents_come_first() {
        let position = |t: Table| Table::ALL.iter().position(|x| *x == t).unwrap();
        for table in Table::ALL {
            if let Some(parent) = table.parent() {
                assert!(
                    position(parent.parent) < position(table),
                    "{} must be seeded before {}",
                    parent.parent,
                    table
                );
            }
        }
    }

    #[test]
    fn test_table_properties() {
        assert_eq!(Table::Partners.order_column(), Some("display_order"));
        assert_eq!(Table::Faqs.order_column(), Some("sort_order"));
        assert_eq!(Table::Settings.order_column(), None);
        assert_eq!(Table::Settings.conflict_key(), Some("key"));
        assert_eq!(Table::Projects.activity_column(), Some(ActivityColumn::Status));
        assert_eq!(Table::Faqs.activity_column(), Some(ActivityColumn::IsActive));
        assert!(Table::Faqs.is_bilingual());
        assert!(!Table::ApiKeys.is_bilingual());
        assert_eq!(
            Table::Technologies.parent().map(|p| p.parent),
            Some(Table::TechnologyCategories)
        );
    }
}
