//! User queries and mutations

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
    sea_query::{Expr, Func},
};
use tracing::info;

use super::converters::{model_to_user, user_to_active_model};
use super::{SeaOrmStorage, contains_pattern, retry};
use crate::errors::{CondensrError, Result};
use crate::storage::models::User;

use migration::entities::{click_event, link, user};

impl SeaOrmStorage {
    pub async fn insert_user(&self, user: &User) -> Result<()> {
        let db = &self.db;
        let model = user_to_active_model(user, true);

        retry::with_retry("insert_user", self.retry_config, || async {
            model.clone().insert(db).await
        })
        .await
        .map_err(|e| CondensrError::database_operation(format!("创建用户失败: {}", e)))?;

        info!("User registered: {}", user.id);
        Ok(())
    }

    pub async fn update_user(&self, user: &User) -> Result<()> {
        let db = &self.db;
        let model = user_to_active_model(user, false);

        retry::with_retry(&format!("update_user({})", user.id), self.retry_config, || async {
            model.clone().update(db).await
        })
        .await
        .map_err(|e| CondensrError::database_operation(format!("更新用户失败: {}", e)))?;

        Ok(())
    }

    pub async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let db = &self.db;
        let model = retry::with_retry("find_user", self.retry_config, || async {
            user::Entity::find_by_id(id).one(db).await
        })
        .await?;

        Ok(model.map(model_to_user))
    }

    /// Lookup by email; emails are stored lowercased
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let db = &self.db;
        let email = email.trim().to_lowercase();
        let model = retry::with_retry("find_user_by_email", self.retry_config, || async {
            user::Entity::find()
                .filter(user::Column::Email.eq(email.as_str()))
                .one(db)
                .await
        })
        .await?;

        Ok(model.map(model_to_user))
    }

    /// 用户列表，按名称或邮箱模糊搜索（不区分大小写）
    pub async fn list_users(&self, search: Option<&str>) -> Result<Vec<User>> {
        let db = &self.db;
        let mut condition = Condition::all();
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = contains_pattern(search);
            condition = condition.add(
                Condition::any()
                    .add(Expr::expr(Func::lower(Expr::col(user::Column::Name))).like(pattern.clone()))
                    .add(user::Column::Email.like(pattern)),
            );
        }

        let models = retry::with_retry("list_users", self.retry_config, || async {
            user::Entity::find()
                .filter(condition.clone())
                .order_by_asc(user::Column::CreatedAt)
                .all(db)
                .await
        })
        .await?;

        Ok(models.into_iter().map(model_to_user).collect())
    }

    pub async fn count_users(&self) -> Result<u64> {
        let db = &self.db;
        let count = retry::with_retry("count_users", self.retry_config, || async {
            user::Entity::find().count(db).await
        })
        .await?;
        Ok(count)
    }

    /// 删除用户及其全部链接与点击记录（事务）
    pub async fn delete_user_cascade(&self, user_id: &str) -> Result<u64> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| CondensrError::database_operation(format!("开始事务失败: {}", e)))?;

        let link_ids: Vec<String> = link::Entity::find()
            .filter(link::Column::OwnerId.eq(user_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect();

        if !link_ids.is_empty() {
            click_event::Entity::delete_many()
                .filter(click_event::Column::LinkId.is_in(link_ids.iter().cloned()))
                .exec(&txn)
                .await?;
        }

        let deleted_links = link::Entity::delete_many()
            .filter(link::Column::OwnerId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;

        let deleted_users = user::Entity::delete_by_id(user_id)
            .exec(&txn)
            .await?
            .rows_affected;

        if deleted_users == 0 {
            txn.rollback().await?;
            return Err(CondensrError::not_found(format!("用户不存在: {}", user_id)));
        }

        txn.commit()
            .await
            .map_err(|e| CondensrError::database_operation(format!("提交事务失败: {}", e)))?;

        self.invalidate_count_cache();
        info!("User {} deleted with {} links", user_id, deleted_links);
        Ok(deleted_links)
    }
}
