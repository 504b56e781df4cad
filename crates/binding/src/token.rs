//! ERC20 calls used by the console.

use alloy_sol_types::sol;

sol! {
    /// The subset of ERC20 that token reads, approvals and transfers need.
    #[sol(rpc)]
    interface IERC20 {
        function name() external view returns (string memory);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);

        /// Remaining amount `spender` may move on behalf of `owner`
        function allowance(address owner, address spender) external view returns (uint256);

        /// Sets the spender's allowance to `amount`, replacing any previous value
        function approve(address spender, uint256 amount) external returns (bool);

        function transfer(address recipient, uint256 amount) external returns (bool);
    }
}
