use crate::core::erp_client::ErpClient;
use crate::domain::model::{
    Customer, DocResponse, ListParams, ListResponse, MethodResponse, Project,
};
use crate::utils::error::Result;

/// Projects visible to the caller. The ERP scopes the list by the session's
/// permissions.
pub async fn get_customer_projects(client: &ErpClient) -> Result<Vec<Project>> {
    let response: ListResponse<Project> = client
        .get_list("Project", &ListParams::with_fields(Project::FIELDS))
        .await?;
    Ok(response.data)
}

pub async fn get_project(client: &ErpClient, name: &str) -> Result<Project> {
    let response: DocResponse<Project> = client.get_doc("Project", name).await?;
    Ok(response.data)
}

/// 登入使用者對應的客戶資料；查不到時回傳 `None`
pub async fn get_customer_info(client: &ErpClient) -> Option<Customer> {
    let args = serde_json::json!({
        "doctype": "Customer",
        "fieldname": Customer::FIELDS,
    });
    match client
        .call::<MethodResponse<Option<Customer>>>("frappe.client.get_value", Some(&args))
        .await
    {
        Ok(response) => response.message,
        Err(e) => {
            tracing::debug!("customer lookup failed: {}", e);
            None
        }
    }
}
