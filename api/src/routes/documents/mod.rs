pub mod add_document_route;
pub mod delete_document_route;
pub mod document_request;
pub mod get_document_route;
pub mod list_documents_route;
