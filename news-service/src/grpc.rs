//! tonic transport adapter over `Processor`.

use tonic::{Request, Response, Status};

use crate::processor::Processor;
use crate::proto::news_server::News;
use crate::proto::{
    Article, ArticleListResponse, DeleteArticleRequest, GetArticlesByPageRequest, GetArticlesByUidRequest,
    GetArticlesRequest, GetNewestArticleRequest, SaveArticleRequest, UpdateArticleRequest,
};

pub struct NewsService {
    processor: Processor,
    articles_limit: i64,
}

impl NewsService {
    pub fn new(processor: Processor, articles_limit: i64) -> Self {
        Self {
            processor,
            articles_limit,
        }
    }
}

fn to_list_response(articles: Vec<crate::models::Article>) -> ArticleListResponse {
    ArticleListResponse {
        articles: articles.into_iter().map(|a| a.into_proto()).collect(),
    }
}

#[tonic::async_trait]
impl News for NewsService {
    async fn get_articles_by_uid(
        &self,
        request: Request<GetArticlesByUidRequest>,
    ) -> Result<Response<ArticleListResponse>, Status> {
        let req = request.into_inner();
        let articles = self.processor.get_articles_by_uid(req.user_id).await?;
        Ok(Response::new(to_list_response(articles)))
    }

    async fn save_article(
        &self,
        request: Request<SaveArticleRequest>,
    ) -> Result<Response<ArticleListResponse>, Status> {
        let req = request.into_inner();
        let articles = self.processor.save_article(req.user_id, &req.link).await?;
        Ok(Response::new(to_list_response(articles)))
    }

    async fn update_article(
        &self,
        request: Request<UpdateArticleRequest>,
    ) -> Result<Response<ArticleListResponse>, Status> {
        let req = request.into_inner();
        let articles = self
            .processor
            .update_article(req.user_id, req.article_id, &req.link)
            .await?;
        Ok(Response::new(to_list_response(articles)))
    }

    async fn delete_article(
        &self,
        request: Request<DeleteArticleRequest>,
    ) -> Result<Response<ArticleListResponse>, Status> {
        let req = request.into_inner();
        let articles = self
            .processor
            .delete_article(req.user_id, req.article_id)
            .await?;
        Ok(Response::new(to_list_response(articles)))
    }

    /// This is the promotion path, not a plain read: it selects the newest not-yet-posted
    /// article, marks it posted, and returns the now-posted article. The gateway's interval
    /// fetch polls this RPC to feed the public `FeedCache`, so every article handed back here
    /// must already carry a `posted_at` or the cache's ordering invariant breaks.
    async fn get_newest_article(
        &self,
        _request: Request<GetNewestArticleRequest>,
    ) -> Result<Response<Article>, Status> {
        let article = self.processor.select_and_send().await?;
        Ok(Response::new(article.into_proto()))
    }

    async fn get_articles(
        &self,
        _request: Request<GetArticlesRequest>,
    ) -> Result<Response<ArticleListResponse>, Status> {
        let articles = self.processor.get_articles().await?;
        Ok(Response::new(to_list_response(articles)))
    }

    async fn get_articles_by_page(
        &self,
        request: Request<GetArticlesByPageRequest>,
    ) -> Result<Response<ArticleListResponse>, Status> {
        let req = request.into_inner();
        let articles = self
            .processor
            .get_articles_by_page(req.page, self.articles_limit)
            .await?;
        Ok(Response::new(to_list_response(articles)))
    }
}
