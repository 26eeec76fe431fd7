mod test_cv_cv_basic;
mod test_intersector_basic;
