pub mod mapper;
pub mod repository;

pub use mapper::{
    map_project_from_database, map_project_to_database, ListInput, Project, ProjectPatch,
    ProjectRecord, ProjectType,
};
pub use repository::ProjectRepository;
